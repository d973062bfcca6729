use super::*;

use crate::animation::ease::Ease;
use crate::timeline::thread::{FnThread, ThreadState, Tween};
use std::cell::RefCell;
use std::rc::Rc;

fn driver(duration: f64, fps: u32) -> (Runtime, Signal<f64>, TimelineDriver) {
    let rt = Runtime::new();
    let time = rt.source("time", 0.0_f64);
    let d = TimelineDriver::new(rt.clone(), time.clone(), duration, Fps::integer(fps).unwrap())
        .unwrap();
    (rt, time, d)
}

#[test]
fn six_seconds_at_thirty_fps_is_180_strictly_increasing_frames() {
    let (_rt, time, mut d) = driver(6.0, 30);
    assert_eq!(d.total_frames(), 180);
    assert_eq!(d.state(), DriverState::Idle);

    let mut seen = Vec::new();
    let produced = d
        .run(|tick| {
            assert_eq!(time.read()?, tick.time_secs);
            seen.push(tick);
            Ok(())
        })
        .unwrap();

    assert_eq!(produced, 180);
    assert_eq!(d.state(), DriverState::Completed);
    for (i, tick) in seen.iter().enumerate() {
        assert_eq!(tick.index, FrameIndex(i as u64));
        assert_eq!(tick.time_secs, i as f64 / 30.0);
    }
    assert!(seen.windows(2).all(|w| w[0].time_secs < w[1].time_secs));
    assert_eq!(d.resume().unwrap(), Step::Done);
}

#[test]
fn fractional_durations_floor_the_frame_count() {
    let (_rt, _time, d) = driver(2.3, 30);
    assert_eq!(d.total_frames(), 69);
    let (_rt, _time, d) = driver(0.0, 30);
    assert_eq!(d.total_frames(), 0);
}

#[test]
fn invalid_duration_is_rejected() {
    let rt = Runtime::new();
    let time = rt.source("time", 0.0_f64);
    let fps = Fps::integer(30).unwrap();
    assert!(TimelineDriver::new(rt.clone(), time.clone(), -1.0, fps).is_err());
    assert!(TimelineDriver::new(rt, time, f64::NAN, fps).is_err());
}

#[test]
fn derived_signals_follow_the_master_time() {
    let (rt, time, mut d) = driver(1.0, 4);
    let t = time.clone();
    let doubled = rt.derived("doubled", move || Ok(t.read()? * 2.0));
    let mut values = Vec::new();
    d.run(|_| {
        values.push(doubled.read()?);
        Ok(())
    })
    .unwrap();
    assert_eq!(values, vec![0.0, 0.5, 1.0, 1.5]);
}

#[test]
fn threads_run_round_robin_once_per_frame() {
    let (_rt, _time, mut d) = driver(0.1, 30);
    let log = Rc::new(RefCell::new(Vec::new()));
    for name in ["first", "second"] {
        let l = log.clone();
        d.spawn(FnThread::new(name, move |ctx: &ThreadCtx<'_>| {
            l.borrow_mut().push((ctx.frame.0, name));
            Ok(ThreadState::Yielded)
        }));
    }
    d.run(|_| Ok(())).unwrap();
    assert_eq!(
        *log.borrow(),
        vec![
            (0, "first"),
            (0, "second"),
            (1, "first"),
            (1, "second"),
            (2, "first"),
            (2, "second"),
        ]
    );
    assert_eq!(d.active_threads(), 0);
}

#[test]
fn tween_thread_is_visible_in_the_same_frame() {
    let (rt, _time, mut d) = driver(1.0, 10);
    let x = rt.source("x", 0.0_f64);
    d.spawn(Tween::new(x.clone(), 0.0, 1.0, 0.5, Ease::Linear).unwrap());

    let mut values = Vec::new();
    d.run(|_| {
        values.push(x.read()?);
        Ok(())
    })
    .unwrap();
    assert_eq!(values.len(), 10);
    assert!((values[1] - 0.2).abs() < 1e-12);
    assert_eq!(values[5], 1.0);
    assert_eq!(values[9], 1.0);
}

#[test]
fn cancel_stops_the_run_and_leaves_signals_readable() {
    let (rt, time, mut d) = driver(6.0, 30);
    let t = time.clone();
    let half = rt.derived("half", move || Ok(t.read()? / 2.0));

    for _ in 0..10 {
        d.resume().unwrap();
        half.read().unwrap();
    }
    d.cancel();
    assert_eq!(d.state(), DriverState::Cancelled);
    assert!(matches!(d.resume().unwrap_err(), StrobeError::Cancelled));
    assert!(rt.is_idle());
    assert!(half.is_dirty());

    let mut fresh =
        TimelineDriver::new(rt.clone(), time.clone(), 0.2, Fps::integer(30).unwrap()).unwrap();
    let mut halves = Vec::new();
    fresh
        .run(|_| {
            halves.push(half.read()?);
            Ok(())
        })
        .unwrap();
    assert_eq!(halves.len(), 6);
    assert_eq!(halves[0], 0.0);
}

#[test]
fn cancel_token_is_polled_at_frame_boundaries() {
    let (_rt, _time, d) = driver(6.0, 30);
    let token = CancelToken::new();
    let mut d = d.with_cancel(token.clone());

    let mut frames = 0;
    let err = d
        .run(|tick| {
            frames += 1;
            if tick.index.0 == 4 {
                token.cancel();
            }
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, StrobeError::Cancelled));
    assert_eq!(frames, 5);
    assert_eq!(d.state(), DriverState::Cancelled);
}

#[test]
fn thread_errors_surface_from_resume() {
    let (_rt, _time, mut d) = driver(1.0, 30);
    d.spawn(FnThread::new("bad", |_ctx: &ThreadCtx<'_>| {
        Err(StrobeError::validation("bad thread"))
    }));
    assert!(matches!(d.resume().unwrap_err(), StrobeError::Validation(_)));
}
