use super::*;

fn zigzag() -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(100.0, 40.0),
        Point::new(200.0, -30.0),
        Point::new(300.0, 10.0),
    ]
}

fn close(a: Point, b: Point) -> bool {
    (a - b).hypot() < 1e-9
}

#[test]
fn fewer_than_two_points_is_rejected() {
    let err = SplineCurve::build(&[Point::ORIGIN], 0.5, false).unwrap_err();
    assert!(matches!(err, StrobeError::InsufficientPoints { got: 1 }));
    let err = SplineCurve::build(&[], 0.5, true).unwrap_err();
    assert!(matches!(err, StrobeError::InsufficientPoints { got: 0 }));
}

#[test]
fn non_finite_smoothness_and_coordinates_are_rejected() {
    assert!(SplineCurve::build(&zigzag(), f64::NAN, false).is_err());
    let bad = [Point::new(0.0, 0.0), Point::new(f64::INFINITY, 1.0)];
    assert!(SplineCurve::build(&bad, 0.5, false).is_err());
}

#[test]
fn out_of_range_smoothness_is_clamped() {
    let high = SplineCurve::build(&zigzag(), 1.5, false).unwrap();
    assert_eq!(high.smoothness(), 1.0);
    let full = SplineCurve::build(&zigzag(), 1.0, false).unwrap();
    assert_eq!(high.length(), full.length());

    let low = SplineCurve::build(&zigzag(), -0.3, false).unwrap();
    assert_eq!(low.smoothness(), 0.0);
}

#[test]
fn open_curve_endpoints_match_control_points_for_any_smoothness() {
    let pts = zigzag();
    for s in [0.0, 0.35, 0.55, 1.0] {
        let c = SplineCurve::build(&pts, s, false).unwrap();
        assert_eq!(c.point_at_percentage(0.0).position, pts[0]);
        assert_eq!(c.point_at_percentage(1.0).position, pts[3]);
        // Out-of-range input clamps on open curves.
        assert_eq!(c.point_at_percentage(-0.5).position, pts[0]);
        assert_eq!(c.point_at_percentage(7.0).position, pts[3]);
    }
}

#[test]
fn closed_curve_start_equals_end_and_wraps() {
    let c = SplineCurve::build(&zigzag(), 0.45, true).unwrap();
    assert_eq!(
        c.point_at_percentage(0.0).position,
        c.point_at_percentage(1.0).position
    );
    assert!(close(
        c.point_at_percentage(1.25).position,
        c.point_at_percentage(0.25).position
    ));
    assert!(close(
        c.point_at_percentage(-0.25).position,
        c.point_at_percentage(0.75).position
    ));
    assert_eq!(c.spans().len(), 4);
}

#[test]
fn nan_input_samples_the_start() {
    let c = SplineCurve::build(&zigzag(), 0.5, false).unwrap();
    assert_eq!(c.point_at_percentage(f64::NAN).position, Point::new(0.0, 0.0));
}

#[test]
fn zero_smoothness_is_a_polyline_sampled_by_distance() {
    let pts = [
        Point::new(0.0, 0.0),
        Point::new(100.0, 0.0),
        Point::new(100.0, 100.0),
    ];
    let c = SplineCurve::build(&pts, 0.0, false).unwrap();
    assert!((c.length() - 200.0).abs() < 1e-6);

    let mid = c.point_at_percentage(0.5);
    assert!(close(mid.position, Point::new(100.0, 0.0)));
    let quarter = c.point_at_percentage(0.25);
    assert!((quarter.position.x - 50.0).abs() < 1e-6);
    assert!(quarter.position.y.abs() < 1e-9);
    assert!((quarter.tangent - Vec2::new(1.0, 0.0)).hypot() < 1e-9);
    let late = c.point_at_percentage(0.75);
    assert!((late.tangent - Vec2::new(0.0, 1.0)).hypot() < 1e-9);
}

#[test]
fn sampling_is_continuous_and_monotone_in_distance() {
    let c = SplineCurve::build(&zigzag(), 0.55, false).unwrap();
    let step = c.length() / 200.0;
    let mut prev = c.point_at_percentage(0.0).position;
    for i in 1..=200 {
        let p = c.point_at_percentage(i as f64 / 200.0).position;
        let d = (p - prev).hypot();
        assert!(d < step * 1.5, "jump of {d} at sample {i}");
        prev = p;
    }
}

#[test]
fn tangents_are_unit_length() {
    let c = SplineCurve::build(&zigzag(), 0.4, true).unwrap();
    for i in 0..=20 {
        let t = c.point_at_percentage(i as f64 / 20.0).tangent;
        assert!((t.hypot() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn degenerate_curve_falls_back_to_positive_x_tangent() {
    let p = Point::new(5.0, 5.0);
    let c = SplineCurve::build(&[p, p], 0.5, false).unwrap();
    assert_eq!(c.length(), 0.0);
    let s = c.point_at_percentage(0.5);
    assert_eq!(s.position, p);
    assert_eq!(s.tangent, Vec2::new(1.0, 0.0));
}

#[test]
fn sub_range_remaps_onto_start_and_end() {
    // Sampling between tessellation points is approximate.
    let pts = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
    let c = SplineCurve::build(&pts, 0.5, false)
        .unwrap()
        .with_range(0.2, 0.6)
        .unwrap();
    assert!((c.point_at_percentage(0.0).position.x - 20.0).abs() < 0.1);
    assert!((c.point_at_percentage(1.0).position.x - 60.0).abs() < 0.1);

    let backwards = c.view(VisibleRange::new(0.8, 0.4).unwrap()).unwrap();
    assert!((backwards.point_at_percentage(0.0).position.x - 80.0).abs() < 0.1);
    assert!((backwards.point_at_percentage(1.0).position.x - 40.0).abs() < 0.1);
}

#[test]
fn closed_sub_range_wraps_through_the_seam() {
    let square = [
        Point::new(0.0, 0.0),
        Point::new(100.0, 0.0),
        Point::new(100.0, 100.0),
        Point::new(0.0, 100.0),
    ];
    let c = SplineCurve::build(&square, 0.0, true).unwrap();
    let range = VisibleRange::new(0.875, 0.125).unwrap();
    // Halfway through the window is the seam itself.
    assert!(close(c.sample_in(range, 0.5).position, Point::new(0.0, 0.0)));
    assert!(close(c.sample_in(range, 0.0).position, Point::new(0.0, 50.0)));
    assert!(close(c.sample_in(range, 1.0).position, Point::new(50.0, 0.0)));
}

#[test]
fn visible_path_covers_only_the_window() {
    use kurbo::Shape;

    let pts = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
    let c = SplineCurve::build(&pts, 0.0, false).unwrap();
    let full = c.visible_path().bounding_box();
    assert!((full.width() - 100.0).abs() < 1e-6);

    let part = c.path_in(VisibleRange::new(0.25, 0.5).unwrap()).bounding_box();
    // Distance lookup interpolates between tessellation samples.
    assert!((part.x0 - 25.0).abs() < 0.1);
    assert!((part.x1 - 50.0).abs() < 1e-6);

    let square = [
        Point::new(0.0, 0.0),
        Point::new(100.0, 0.0),
        Point::new(100.0, 100.0),
        Point::new(0.0, 100.0),
    ];
    let closed = SplineCurve::build(&square, 0.0, true).unwrap();
    let seam = closed
        .path_in(VisibleRange::new(0.875, 0.125).unwrap())
        .bounding_box();
    assert!((seam.x1 - 50.0).abs() < 1e-6);
    assert!((seam.y1 - 50.0).abs() < 1e-6);
}

#[test]
fn range_values_are_clamped_and_must_be_finite() {
    let r = VisibleRange::new(-1.0, 2.0).unwrap();
    assert!(r.is_full());
    assert!(VisibleRange::new(f64::NAN, 0.5).is_err());
}
