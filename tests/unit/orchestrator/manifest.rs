use std::sync::Arc;

use super::*;
use crate::scene::descriptor::FnScene;

fn registry() -> SceneRegistry {
    let mut reg = SceneRegistry::new();
    reg.register(Arc::new(FnScene::new("dots", |_ctx| Ok(()))))
        .unwrap();
    reg
}

#[test]
fn defaults_fill_missing_fields() {
    let m = RenderManifest::from_json(
        r#"{ "jobs": [ { "scene": "dots", "out": "out/dots.mp4" } ] }"#,
        "/work",
    )
    .unwrap();
    assert_eq!(m.max_parallelism, 1);
    assert_eq!(m.assets_root(), PathBuf::from("/work"));

    let jobs = m.to_jobs(&registry()).unwrap();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.name, "dots");
    assert_eq!(job.out_path, PathBuf::from("/work/out/dots.mp4"));
    assert_eq!(job.resolution, Resolution::default());
    assert_eq!(job.fps, Fps::integer(30).unwrap());
    assert_eq!(job.duration_secs, 6.0);
}

#[test]
fn explicit_fields_are_carried_into_jobs() {
    let m = RenderManifest::from_json(
        r#"{
            "assets_root": "media",
            "max_parallelism": 2,
            "jobs": [
                {
                    "name": "intro",
                    "scene": "dots",
                    "out": "/abs/intro.mp4",
                    "resolution": { "width": 640, "height": 360 },
                    "fps": 24,
                    "duration_secs": 2.5,
                    "audio": "silence.wav"
                }
            ]
        }"#,
        "/work",
    )
    .unwrap();
    assert_eq!(m.assets_root(), PathBuf::from("/work/media"));

    let job = m.to_jobs(&registry()).unwrap().remove(0);
    assert_eq!(job.name, "intro");
    assert_eq!(job.out_path, PathBuf::from("/abs/intro.mp4"));
    assert_eq!(job.resolution, Resolution::new(640, 360).unwrap());
    assert_eq!(job.fps, Fps::integer(24).unwrap());
    assert_eq!(job.duration_secs, 2.5);
    assert_eq!(job.audio.as_deref(), Some("silence.wav"));
}

#[test]
fn invalid_manifests_are_rejected() {
    let unknown_field = RenderManifest::from_json(r#"{ "jobs": [], "workers": 2 }"#, ".");
    assert!(matches!(unknown_field, Err(StrobeError::Serde(_))));

    let empty = RenderManifest::from_json(r#"{ "jobs": [] }"#, ".").unwrap();
    assert!(empty.validate().is_err());

    let zero = RenderManifest::from_json(
        r#"{ "max_parallelism": 0, "jobs": [ { "scene": "dots", "out": "a.mp4" } ] }"#,
        ".",
    )
    .unwrap();
    assert!(matches!(zero.validate(), Err(StrobeError::Validation(_))));

    let dup = RenderManifest::from_json(
        r#"{ "jobs": [
            { "scene": "dots", "out": "a.mp4" },
            { "scene": "dots", "out": "a.mp4" }
        ] }"#,
        ".",
    )
    .unwrap();
    let err = dup.validate().unwrap_err().to_string();
    assert!(err.contains("jobs[1]") && err.contains("another job"), "{err}");
}

#[test]
fn unknown_scenes_fail_conversion() {
    let m = RenderManifest::from_json(
        r#"{ "jobs": [ { "scene": "nope", "out": "a.mp4" } ] }"#,
        ".",
    )
    .unwrap();
    let err = m.to_jobs(&registry()).unwrap_err();
    assert!(err.to_string().contains("unknown scene 'nope'"));
}

#[test]
fn from_path_resolves_against_the_manifest_directory() {
    let dir = std::env::temp_dir().join(format!("strobe_manifest_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("batch.json");
    std::fs::write(&path, r#"{ "jobs": [ { "scene": "dots", "out": "o.mp4" } ] }"#).unwrap();

    let m = RenderManifest::from_path(&path).unwrap();
    assert_eq!(
        m.to_jobs(&registry()).unwrap()[0].out_path,
        dir.join("o.mp4")
    );
    assert!(RenderManifest::from_path(&dir.join("missing.json")).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn portrait_batch_covers_every_built_in_scene() {
    let m = RenderManifest::from_json(
        include_str!("../../../demos/portrait-all.json"),
        "/work/demos",
    )
    .unwrap();
    let jobs = m.to_jobs(&crate::scenes::registry().unwrap()).unwrap();
    let names: Vec<&str> = jobs.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, vec!["portrait_blob", "portrait_neural", "portrait_radar"]);
    for job in &jobs {
        assert_eq!(job.resolution, Resolution::new(720, 1280).unwrap());
        assert!(job.out_path.starts_with("/work/demos/../outputs"));
    }
}
