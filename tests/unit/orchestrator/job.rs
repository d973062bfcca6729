use super::*;
use crate::scene::descriptor::FnScene;

fn scene() -> Arc<dyn SceneDescriptor> {
    Arc::new(FnScene::new("empty", |_ctx| Ok(())))
}

#[test]
fn job_spec_defaults_follow_batch_settings() {
    let job = JobSpec::new(scene(), "out/a.mp4");
    assert_eq!(job.name, "empty");
    assert_eq!(job.resolution, Resolution::default());
    assert_eq!(job.fps, Fps::integer(30).unwrap());
    assert_eq!(job.duration_secs, 6.0);
    assert!(job.audio.is_none());
    job.validate().unwrap();
}

#[test]
fn job_spec_validation_rejects_bad_timing() {
    let job = JobSpec::new(scene(), "out/a.mp4").with_duration(0.0);
    assert!(matches!(job.validate(), Err(StrobeError::Validation(_))));
    let job = JobSpec::new(scene(), "out/a.mp4").with_duration(f64::NAN);
    assert!(job.validate().is_err());
    let job = JobSpec::new(scene(), "");
    assert!(job.validate().is_err());
}

#[test]
fn report_separates_succeeded_and_failed() {
    let report = RenderReport {
        jobs: vec![
            JobReport {
                id: JobId(0),
                name: "a".into(),
                outcome: JobOutcome::Done {
                    path: PathBuf::from("a.mp4"),
                },
                frames: 3,
                elapsed: Duration::from_millis(10),
            },
            JobReport {
                id: JobId(1),
                name: "b".into(),
                outcome: JobOutcome::from_error(&StrobeError::asset_not_found("x.wav", "gone")),
                frames: 0,
                elapsed: Duration::ZERO,
            },
        ],
        peak_parallelism: 1,
    };

    assert_eq!(report.succeeded().count(), 1);
    assert_eq!(report.failed().count(), 1);
    assert!(!report.all_succeeded());
    assert_eq!(report.jobs[1].outcome.fault(), Some(FaultKind::AssetNotFound));

    let summary = report.summary();
    assert!(summary.starts_with("1/2 jobs succeeded"));
    assert!(summary.contains("job-0 a: a.mp4"));
    assert!(summary.contains("job-1 b: AssetNotFound"));
}

#[test]
fn outcome_serializes_with_status_tag() {
    let v = serde_json::to_value(JobOutcome::Done {
        path: PathBuf::from("x.mp4"),
    })
    .unwrap();
    assert_eq!(v["status"], "done");
    assert_eq!(v["path"], "x.mp4");
}

#[test]
fn closures_are_observers() {
    let seen = std::sync::Mutex::new(Vec::new());
    let obs = |id: JobId, _name: &str, state: JobState| seen.lock().unwrap().push((id, state));
    obs.on_transition(JobId(2), "c", JobState::Rendering);
    assert_eq!(seen.lock().unwrap().as_slice(), &[(JobId(2), JobState::Rendering)]);
    assert!(JobState::Done.is_terminal());
    assert!(!JobState::Encoding.is_terminal());
}
