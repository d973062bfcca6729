use super::*;

fn cfg() -> EncodeConfig {
    EncodeConfig {
        width: 2,
        height: 2,
        fps: Fps::integer(30).unwrap(),
        out_path: PathBuf::from("out/a.mp4"),
        audio: None,
    }
}

#[test]
fn in_memory_encoder_captures_frames_in_order() {
    let mut enc = InMemoryEncoder::new();
    enc.begin(&cfg()).unwrap();
    enc.push_frame(FrameIndex(0), &FrameRGBA::transparent(2, 2))
        .unwrap();
    enc.push_frame(FrameIndex(1), &FrameRGBA::transparent(2, 2))
        .unwrap();
    assert_eq!(enc.finish().unwrap(), PathBuf::from("out/a.mp4"));
    assert_eq!(enc.frames().len(), 2);
    assert!(enc.is_finished());
    assert_eq!(enc.config().unwrap().fps, Fps::integer(30).unwrap());
}

#[test]
fn out_of_order_and_mis_sized_frames_are_encode_faults() {
    let mut enc = InMemoryEncoder::new();
    enc.begin(&cfg()).unwrap();
    enc.push_frame(FrameIndex(3), &FrameRGBA::transparent(2, 2))
        .unwrap();
    let err = enc
        .push_frame(FrameIndex(3), &FrameRGBA::transparent(2, 2))
        .unwrap_err();
    assert!(matches!(err, StrobeError::Encode(_)));
    let err = enc
        .push_frame(FrameIndex(4), &FrameRGBA::transparent(4, 2))
        .unwrap_err();
    assert!(matches!(err, StrobeError::Encode(_)));
}

#[test]
fn push_before_begin_fails_and_abort_is_recorded() {
    let mut enc = InMemoryEncoder::new();
    assert!(
        enc.push_frame(FrameIndex(0), &FrameRGBA::transparent(2, 2))
            .is_err()
    );
    assert!(enc.finish().is_err());
    enc.abort();
    assert!(enc.is_aborted());
}
