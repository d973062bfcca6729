use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        StrobeError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(StrobeError::render("x").to_string().contains("render fault:"));
    assert!(StrobeError::encode("x").to_string().contains("encode fault:"));
    assert!(
        StrobeError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn cycle_message_names_every_signal() {
    let err = StrobeError::CyclicDependency {
        chain: vec!["a".to_owned(), "b".to_owned(), "a".to_owned()],
    };
    assert_eq!(err.to_string(), "cyclic dependency: a -> b -> a");
    assert_eq!(err.kind(), FaultKind::CyclicDependency);
}

#[test]
fn kinds_map_one_to_one() {
    assert_eq!(
        StrobeError::asset_not_found("silence.wav", "missing").kind(),
        FaultKind::AssetNotFound
    );
    assert_eq!(StrobeError::Cancelled.kind(), FaultKind::Cancelled);
    assert_eq!(
        StrobeError::InsufficientPoints { got: 1 }.kind(),
        FaultKind::InsufficientPoints
    );
    assert_eq!(
        StrobeError::Timeout {
            stage: "render",
            limit_ms: 5
        }
        .kind(),
        FaultKind::Timeout
    );
    assert_eq!(FaultKind::RenderFault.to_string(), "RenderFault");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = StrobeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), FaultKind::Other);
}
