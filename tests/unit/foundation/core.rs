use super::*;

#[test]
fn integer_fps_frame_times_are_exact_quotients() {
    let fps = Fps::integer(30).unwrap();
    for i in 0..180u64 {
        assert_eq!(fps.frames_to_secs(i), i as f64 / 30.0);
    }
}

#[test]
fn fps_frames_secs_roundtrip_floor() {
    let fps = Fps::new(30000, 1001).unwrap();
    let secs = fps.frames_to_secs(123);
    assert_eq!(fps.secs_to_frames_floor(secs), 123);
    assert_eq!(Fps::integer(30).unwrap().secs_to_frames_floor(2.3), 69);
    assert_eq!(Fps::integer(30).unwrap().secs_to_frames_floor(6.0), 180);
}

#[test]
fn zero_fps_and_resolution_are_rejected() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert!(Resolution::new(0, 10).is_err());
    assert_eq!(
        Resolution::default(),
        Resolution {
            width: 1280,
            height: 720
        }
    );
}

#[test]
fn transform_to_affine_identity_and_translation() {
    let t = Transform2D::default();
    assert_eq!(t.to_affine(), Affine::IDENTITY);

    let t = Transform2D {
        translate: Vec2::new(10.0, -2.5),
        ..Transform2D::default()
    };
    assert_eq!(t.to_affine(), Affine::translate(Vec2::new(10.0, -2.5)));
}

#[test]
fn transform_pivots_around_its_anchor() {
    let t = Transform2D {
        rotation_rad: std::f64::consts::FRAC_PI_2,
        scale: Vec2::new(2.0, 2.0),
        anchor: Vec2::new(10.0, 0.0),
        ..Transform2D::default()
    };
    let a = t.to_affine();
    // The anchor itself stays put.
    let pivot = a * Point::new(10.0, 0.0);
    assert!((pivot.x - 10.0).abs() < 1e-9 && pivot.y.abs() < 1e-9);
    let p = a * Point::new(11.0, 0.0);
    assert!((p.x - 10.0).abs() < 1e-9 && (p.y - 2.0).abs() < 1e-9);
}
