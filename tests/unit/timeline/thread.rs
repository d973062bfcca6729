use super::*;

use std::cell::RefCell;
use std::rc::Rc;

fn drive(rt: &Runtime, thread: &mut dyn Thread, frames: u64) -> Vec<ThreadState> {
    let fps = Fps::integer(10).unwrap();
    (0..frames)
        .map(|i| {
            let ctx = ThreadCtx {
                frame: FrameIndex(i),
                time_secs: fps.frames_to_secs(i),
                fps,
                runtime: rt,
            };
            thread.resume(&ctx).unwrap()
        })
        .collect()
}

#[test]
fn tween_reaches_target_after_its_duration() {
    let rt = Runtime::new();
    let x = rt.source("x", 0.0_f64);
    let mut tw = Tween::new(x.clone(), 0.0, 10.0, 0.5, Ease::Linear).unwrap();

    let states = drive(&rt, &mut tw, 6);
    assert_eq!(states[..5], [ThreadState::Yielded; 5]);
    assert_eq!(states[5], ThreadState::Finished);
    assert_eq!(x.read().unwrap(), 10.0);
}

#[test]
fn tween_writes_eased_intermediate_values() {
    let rt = Runtime::new();
    let x = rt.source("x", 0.0_f64);
    let mut tw = Tween::new(x.clone(), 0.0, 1.0, 1.0, Ease::InQuad).unwrap();
    drive(&rt, &mut tw, 6);
    // Frame 5 at 10 fps is halfway.
    assert!((x.read().unwrap() - 0.25).abs() < 1e-12);
}

#[test]
fn zero_length_tween_finishes_immediately() {
    let rt = Runtime::new();
    let x = rt.source("x", 1.0_f64);
    let mut tw = Tween::new(x.clone(), 1.0, 3.0, 0.0, Ease::Linear).unwrap();
    assert_eq!(drive(&rt, &mut tw, 1), vec![ThreadState::Finished]);
    assert_eq!(x.read().unwrap(), 3.0);
    assert!(Tween::new(x, 0.0, 1.0, -1.0, Ease::Linear).is_err());
}

#[test]
fn sequence_starts_the_next_child_in_the_same_frame() {
    let rt = Runtime::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    let marker = FnThread::new("marker", move |ctx: &ThreadCtx<'_>| {
        l.borrow_mut().push(ctx.frame.0);
        Ok(ThreadState::Finished)
    });
    let mut seq = Sequence::default().then(WaitFor::new(0.3)).then(marker);

    let states = drive(&rt, &mut seq, 5);
    assert_eq!(
        states,
        vec![
            ThreadState::Yielded,
            ThreadState::Yielded,
            ThreadState::Yielded,
            ThreadState::Finished,
            ThreadState::Finished,
        ]
    );
    assert_eq!(*log.borrow(), vec![3]);
}

#[test]
fn all_resumes_children_in_registration_order() {
    let rt = Runtime::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let make = |name: &'static str, frames: u64| {
        let l = log.clone();
        let mut left = frames;
        FnThread::new(name, move |_ctx: &ThreadCtx<'_>| {
            l.borrow_mut().push(name);
            left -= 1;
            Ok(if left == 0 {
                ThreadState::Finished
            } else {
                ThreadState::Yielded
            })
        })
    };
    let mut all = All::default().with(make("a", 1)).with(make("b", 2));

    let states = drive(&rt, &mut all, 2);
    assert_eq!(states, vec![ThreadState::Yielded, ThreadState::Finished]);
    assert_eq!(*log.borrow(), vec!["a", "b", "b"]);
}

#[test]
fn empty_combinators_finish_at_once() {
    let rt = Runtime::new();
    assert_eq!(
        drive(&rt, &mut Sequence::default(), 1),
        vec![ThreadState::Finished]
    );
    assert_eq!(drive(&rt, &mut All::default(), 1), vec![ThreadState::Finished]);
}
