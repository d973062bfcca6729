use super::*;

#[test]
fn derived_reads_are_cached_until_a_source_changes() {
    let rt = Runtime::new();
    let a = rt.source("a", 2.0_f64);
    let a2 = a.clone();
    let doubled = rt.derived("doubled", move || Ok(a2.read()? * 2.0));

    assert_eq!(doubled.read().unwrap(), 4.0);
    assert_eq!(doubled.read().unwrap(), 4.0);
    assert_eq!(rt.recompute_count(), 1);

    a.write(5.0).unwrap();
    assert!(doubled.is_dirty());
    assert_eq!(doubled.read().unwrap(), 10.0);
    assert_eq!(rt.recompute_count(), 2);
}

#[test]
fn invalidation_reaches_transitive_dependents() {
    let rt = Runtime::new();
    let a = rt.source("a", 1_i64);
    let a2 = a.clone();
    let b = rt.derived("b", move || Ok(a2.read()? + 1));
    let b2 = b.clone();
    let c = rt.derived("c", move || Ok(b2.read()? * 10));

    assert_eq!(c.read().unwrap(), 20);
    a.write(4).unwrap();
    assert!(b.is_dirty());
    assert!(c.is_dirty());
    assert_eq!(c.read().unwrap(), 50);
}

#[test]
fn dependencies_are_retracked_after_a_branch_switch() {
    let rt = Runtime::new();
    let flag = rt.source("flag", true);
    let left = rt.source("left", 1_i32);
    let right = rt.source("right", 2_i32);

    let (f, l, r) = (flag.clone(), left.clone(), right.clone());
    let pick = rt.derived("pick", move || {
        if f.read()? { l.read() } else { r.read() }
    });

    assert_eq!(pick.read().unwrap(), 1);
    assert_eq!(rt.dependencies_of(pick.id()), vec![flag.id(), left.id()]);

    flag.write(false).unwrap();
    assert_eq!(pick.read().unwrap(), 2);
    assert_eq!(rt.dependencies_of(pick.id()), vec![flag.id(), right.id()]);
    assert!(rt.dependents_of(left.id()).is_empty());

    // The old branch no longer invalidates the signal.
    let before = rt.recompute_count();
    left.write(100).unwrap();
    assert!(!pick.is_dirty());
    assert_eq!(pick.read().unwrap(), 2);
    assert_eq!(rt.recompute_count(), before);
}

#[test]
fn writing_a_derived_signal_is_rejected() {
    let rt = Runtime::new();
    let d = rt.derived("d", || Ok(1_u8));
    let err = d.write(2).unwrap_err();
    assert!(matches!(err, StrobeError::Validation(_)));
}

#[test]
fn writes_during_evaluation_are_rejected() {
    let rt = Runtime::new();
    let s = rt.source("s", 0_i32);
    let s2 = s.clone();
    let impure = rt.derived("impure", move || {
        s2.write(1)?;
        Ok(0_i32)
    });
    assert!(matches!(
        impure.read().unwrap_err(),
        StrobeError::Validation(_)
    ));
    assert_eq!(s.read().unwrap(), 0);
    assert!(rt.is_idle());
}

#[test]
fn self_cycle_reports_chain_and_leaves_runtime_usable() {
    let rt = Runtime::new();
    let slot: Rc<std::cell::RefCell<Option<Signal<i32>>>> = Rc::default();
    let slot2 = slot.clone();
    let a = rt.derived("a", move || match slot2.borrow().as_ref() {
        Some(me) => me.read(),
        None => Ok(0),
    });
    *slot.borrow_mut() = Some(a.clone());

    match a.read().unwrap_err() {
        StrobeError::CyclicDependency { chain } => assert_eq!(chain, vec!["a", "a"]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(rt.is_idle());
    assert!(a.is_dirty());

    let ok = rt.derived("ok", || Ok(7_i32));
    assert_eq!(ok.read().unwrap(), 7);
}

#[test]
fn two_signal_cycle_lists_both_names() {
    let rt = Runtime::new();
    let slot: Rc<std::cell::RefCell<Option<Signal<i32>>>> = Rc::default();
    let slot2 = slot.clone();
    let a = rt.derived("a", move || match slot2.borrow().as_ref() {
        Some(b) => b.read(),
        None => Ok(0),
    });
    let a2 = a.clone();
    let b = rt.derived("b", move || a2.read());
    *slot.borrow_mut() = Some(b);

    let err = a.read().unwrap_err();
    assert_eq!(err.to_string(), "cyclic dependency: a -> b -> a");
    assert!(rt.is_idle());
}

#[test]
fn volatile_signals_recompute_every_tick() {
    let rt = Runtime::new();
    let calls = Rc::new(std::cell::Cell::new(0_u32));
    let c = calls.clone();
    let v = rt.volatile("v", move || {
        c.set(c.get() + 1);
        Ok(c.get())
    });
    let v2 = v.clone();
    let above = rt.derived("above", move || Ok(v2.read()? + 100));

    assert_eq!(above.read().unwrap(), 101);
    assert_eq!(above.read().unwrap(), 101);
    rt.advance_tick();
    assert_eq!(rt.tick(), 1);
    assert_eq!(above.read().unwrap(), 102);
}

#[test]
fn invalidate_all_forces_recompute() {
    let rt = Runtime::new();
    let d = rt.derived("d", || Ok(String::from("x")));
    d.read().unwrap();
    rt.invalidate_all();
    assert!(d.is_dirty());
    d.read().unwrap();
    assert_eq!(rt.recompute_count(), 2);
}

#[test]
fn map_and_update_helpers() {
    let rt = Runtime::new();
    let n = rt.source("n", 3_u32);
    let label = n.map("label", |v| format!("n={v}")).unwrap();
    assert_eq!(label.read().unwrap(), "n=3");
    n.update(|v| v + 1).unwrap();
    assert_eq!(label.read().unwrap(), "n=4");
    assert_eq!(label.name(), "label");
}

#[test]
fn handles_fail_after_runtime_is_dropped() {
    let s = {
        let rt = Runtime::new();
        rt.source("gone", 1_u8)
    };
    assert!(matches!(s.read().unwrap_err(), StrobeError::Validation(_)));
}

#[test]
fn compute_errors_propagate_and_stay_dirty() {
    let rt = Runtime::new();
    let fail = rt.source("fail", true);
    let f = fail.clone();
    let d = rt.derived("d", move || {
        if f.read()? {
            Err(StrobeError::render("boom"))
        } else {
            Ok(1_i32)
        }
    });
    assert!(d.read().is_err());
    assert!(d.is_dirty());
    fail.write(false).unwrap();
    assert_eq!(d.read().unwrap(), 1);
}
