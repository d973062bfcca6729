use std::io::Read;

use super::*;
use crate::foundation::error::FaultKind;

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b.wav").unwrap(), "a/b.wav");
    assert_eq!(normalize_rel_path("a\\b.wav").unwrap(), "a/b.wav");
    assert_eq!(normalize_rel_path("./a//b.wav").unwrap(), "a/b.wav");
    assert!(normalize_rel_path("../x.wav").is_err());
    assert!(normalize_rel_path("/abs.wav").is_err());
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("./.").is_err());
}

#[test]
fn memory_resolver_reads_registered_bytes() {
    let assets = MemoryAssetResolver::new()
        .with("audio/silence.wav", vec![1u8, 2, 3])
        .unwrap();
    let mut buf = Vec::new();
    assets
        .open("./audio/silence.wav")
        .unwrap()
        .read_to_end(&mut buf)
        .unwrap();
    assert_eq!(buf, vec![1, 2, 3]);
    assert!(assets.local_path("audio/silence.wav").unwrap().is_none());
}

#[test]
fn missing_assets_report_asset_not_found() {
    let assets = MemoryAssetResolver::new();
    let err = assets.open("nope.wav").err().unwrap();
    assert_eq!(err.kind(), FaultKind::AssetNotFound);
    assert!(err.to_string().contains("nope.wav"));

    let dir = DirAssetResolver::new(std::env::temp_dir().join("strobe_no_such_root"));
    assert_eq!(dir.open("a.wav").err().unwrap().kind(), FaultKind::AssetNotFound);
    assert_eq!(
        dir.open("../escape.wav").err().unwrap().kind(),
        FaultKind::AssetNotFound
    );
}

#[test]
fn dir_resolver_finds_files_below_root() {
    let root = std::env::temp_dir().join(format!("strobe_assets_{}", std::process::id()));
    std::fs::create_dir_all(root.join("audio")).unwrap();
    std::fs::write(root.join("audio/track.wav"), b"RIFF").unwrap();

    let assets = DirAssetResolver::new(&root);
    let path = assets.local_path("audio/track.wav").unwrap().unwrap();
    assert_eq!(path, root.join("audio/track.wav"));
    let mut buf = String::new();
    assets
        .open("audio\\track.wav")
        .unwrap()
        .read_to_string(&mut buf)
        .unwrap();
    assert_eq!(buf, "RIFF");
    let _ = std::fs::remove_dir_all(&root);
}
