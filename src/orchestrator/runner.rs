use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::assets::resolver::AssetResolver;
use crate::encode::sink::{EncodeConfig, EncoderFactory, MediaEncoder};
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{StrobeError, StrobeResult};
use crate::orchestrator::job::{
    JobId, JobObserver, JobOutcome, JobReport, JobSpec, JobState, RenderReport,
};
use crate::orchestrator::slots::WorkerSlots;
use crate::render::backend::RendererFactory;
use crate::scene::descriptor::{SceneParams, instantiate};
use crate::timeline::driver::{FrameTick, Step};

/// Deadlines checked around collaborator calls.
///
/// Calls are not interrupted; a call that returns after its deadline fails the job with
/// [`StrobeError::Timeout`]. Signal state is never touched by the check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageLimits {
    /// Upper bound for one `FrameRenderer::render` call.
    pub frame: Option<Duration>,
    /// Upper bound for one encoder call (`begin`, `push_frame` or `finish`).
    pub encode: Option<Duration>,
}

/// Orchestrator configuration.
#[derive(Clone, Debug)]
pub struct OrchestratorOpts {
    /// Maximum number of jobs in flight. Must be >= 1.
    pub max_parallelism: usize,
    /// Collaborator deadlines.
    pub limits: StageLimits,
    /// Cancels in-flight jobs at the next frame boundary and stops admission.
    pub cancel: CancelToken,
}

impl Default for OrchestratorOpts {
    fn default() -> Self {
        Self {
            max_parallelism: 1,
            limits: StageLimits::default(),
            cancel: CancelToken::new(),
        }
    }
}

/// Runs batches of render jobs on a bounded worker pool.
pub struct Orchestrator {
    renderers: Arc<dyn RendererFactory>,
    encoders: Arc<dyn EncoderFactory>,
    assets: Arc<dyn AssetResolver>,
    opts: OrchestratorOpts,
    observer: Option<Arc<dyn JobObserver>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("opts", &self.opts)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator over the given collaborators.
    pub fn new(
        renderers: Arc<dyn RendererFactory>,
        encoders: Arc<dyn EncoderFactory>,
        assets: Arc<dyn AssetResolver>,
        opts: OrchestratorOpts,
    ) -> Self {
        Self {
            renderers,
            encoders,
            assets,
            opts,
            observer: None,
        }
    }

    /// Report every job state transition to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Token cancelling this orchestrator's runs.
    pub fn cancel_token(&self) -> CancelToken {
        self.opts.cancel.clone()
    }

    /// Cancel in-flight and queued jobs.
    pub fn cancel(&self) {
        self.opts.cancel.cancel();
    }

    /// Run `jobs`, at most `max_parallelism` at a time, admitting them in input order.
    ///
    /// Job faults are recorded in the report; only invalid options fail the call itself.
    pub fn run_jobs(&self, jobs: Vec<JobSpec>) -> StrobeResult<RenderReport> {
        if self.opts.max_parallelism == 0 {
            return Err(StrobeError::validation("max_parallelism must be >= 1"));
        }

        let total = jobs.len();
        let workers = self.opts.max_parallelism.min(total).max(1);
        let slots = WorkerSlots::new(self.opts.max_parallelism);
        let results: Mutex<Vec<Option<JobReport>>> = Mutex::new(vec![None; total]);
        let mut queued = VecDeque::with_capacity(total);
        for (i, job) in jobs.into_iter().enumerate() {
            let id = JobId(i);
            self.notify(id, &job.name, JobState::Queued);
            queued.push_back((id, job));
        }
        let names: Vec<String> = queued.iter().map(|(_, j)| j.name.clone()).collect();
        let queue = Mutex::new(queued);

        tracing::info!(jobs = total, workers, "render batch started");
        let pool = build_thread_pool(workers)?;
        pool.scope(|s| {
            for _ in 0..workers {
                s.spawn(|_| {
                    self.worker_loop(&queue, &slots, &results);
                });
            }
        });

        let results = results.into_inner().unwrap_or_else(PoisonError::into_inner);
        let jobs = results
            .into_iter()
            .zip(names)
            .enumerate()
            .map(|(i, (report, name))| {
                report.unwrap_or_else(|| {
                    // Never admitted: the batch was cancelled first.
                    self.notify(JobId(i), &name, JobState::Failed);
                    JobReport {
                        id: JobId(i),
                        name,
                        outcome: JobOutcome::from_error(&StrobeError::Cancelled),
                        frames: 0,
                        elapsed: Duration::ZERO,
                    }
                })
            })
            .collect();

        let report = RenderReport {
            jobs,
            peak_parallelism: slots.peak(),
        };
        tracing::info!(
            succeeded = report.succeeded().count(),
            failed = report.failed().count(),
            "render batch finished"
        );
        Ok(report)
    }

    fn worker_loop(
        &self,
        queue: &Mutex<VecDeque<(JobId, JobSpec)>>,
        slots: &WorkerSlots,
        results: &Mutex<Vec<Option<JobReport>>>,
    ) {
        loop {
            if self.opts.cancel.is_cancelled() {
                return;
            }
            let _slot = slots.acquire();
            if self.opts.cancel.is_cancelled() {
                return;
            }
            let next = queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            let Some((id, job)) = next else {
                return;
            };
            let report = self.run_job(id, job);
            let mut results = results.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = results.get_mut(id.0) {
                *entry = Some(report);
            }
        }
    }

    #[tracing::instrument(skip_all, fields(job = %id, name = %job.name))]
    fn run_job(&self, id: JobId, job: JobSpec) -> JobReport {
        let started = Instant::now();
        self.notify(id, &job.name, JobState::Rendering);
        tracing::info!(out = %job.out_path.display(), "job started");

        let mut encoder: Option<Box<dyn MediaEncoder>> = None;
        let mut frames = 0u64;
        let result = self.execute(id, &job, &mut encoder, &mut frames);

        let outcome = match result {
            Ok(path) => {
                self.notify(id, &job.name, JobState::Done);
                tracing::info!(out = %path.display(), frames, "job finished");
                JobOutcome::Done { path }
            }
            Err(err) => {
                if let Some(enc) = encoder.as_mut() {
                    enc.abort();
                }
                self.notify(id, &job.name, JobState::Failed);
                tracing::warn!(kind = %err.kind(), error = %err, "job failed");
                JobOutcome::from_error(&err)
            }
        };

        JobReport {
            id,
            name: job.name,
            outcome,
            frames,
            elapsed: started.elapsed(),
        }
    }

    fn execute(
        &self,
        id: JobId,
        job: &JobSpec,
        encoder_slot: &mut Option<Box<dyn MediaEncoder>>,
        frames: &mut u64,
    ) -> StrobeResult<PathBuf> {
        job.validate()?;
        let audio = match job.audio.as_deref() {
            Some(name) => Some(self.resolve_audio(id, name)?),
            None => None,
        };

        let params = SceneParams {
            duration_secs: job.duration_secs,
            fps: job.fps,
            resolution: job.resolution,
        };
        let mut scene = instantiate(job.scene.as_ref(), params, Some(self.opts.cancel.clone()))?;

        // Evaluate every binding once so graph faults surface before any collaborator runs.
        scene.snapshot(FrameTick {
            index: crate::foundation::core::FrameIndex(0),
            time_secs: 0.0,
        })?;

        let mut renderer = self.renderers.create()?;
        let encoder = encoder_slot.insert(self.encoders.create()?);
        let limits = self.opts.limits;
        let cfg = EncodeConfig {
            width: job.resolution.width,
            height: job.resolution.height,
            fps: job.fps,
            out_path: job.out_path.clone(),
            audio: audio.as_ref().map(|a| a.path.clone()),
        };
        timed("encode", limits.encode, || encoder.begin(&cfg))?;

        while let Step::Frame(tick) = scene.driver.resume()? {
            let snapshot = scene.graph.snapshot(tick)?;
            let frame = timed("render", limits.frame, || {
                renderer.render(&snapshot, job.resolution)
            })?;
            timed("encode", limits.encode, || {
                encoder.push_frame(tick.index, &frame)
            })?;
            *frames += 1;
        }

        self.notify(id, &job.name, JobState::Encoding);
        let path = timed("encode", limits.encode, || encoder.finish())?;
        if self.opts.cancel.is_cancelled() {
            return Err(StrobeError::Cancelled);
        }
        drop(audio);
        Ok(path)
    }

    fn resolve_audio(&self, id: JobId, name: &str) -> StrobeResult<AudioInput> {
        if let Some(path) = self.assets.local_path(name)? {
            return Ok(AudioInput { path, _temp: None });
        }

        let mut reader = self.assets.open(name)?;
        let file_name = std::path::Path::new(name)
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_owned());
        let path = std::env::temp_dir().join(staging_name(id, &file_name));
        let guard = TempFileGuard(path.clone());
        let mut file = std::fs::File::create(&path).map_err(|e| {
            StrobeError::encode(format!(
                "failed to stage audio '{name}' at '{}': {e}",
                path.display()
            ))
        })?;
        std::io::copy(&mut reader, &mut file)
            .map_err(|e| StrobeError::asset_not_found(name, format!("read failed: {e}")))?;
        tracing::debug!(asset = name, staged = %path.display(), "audio staged");
        Ok(AudioInput {
            path,
            _temp: Some(guard),
        })
    }

    fn notify(&self, id: JobId, name: &str, state: JobState) {
        if let Some(obs) = &self.observer {
            obs.on_transition(id, name, state);
        }
    }
}

struct AudioInput {
    path: PathBuf,
    _temp: Option<TempFileGuard>,
}

/// Removes a staged file on drop.
struct TempFileGuard(PathBuf);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

static STAGED: AtomicU64 = AtomicU64::new(0);

// Unique per process and per call, so concurrent runs never share a staged file.
fn staging_name(id: JobId, file_name: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!(
        "strobe-{}-{nanos}-{}-{}-{file_name}",
        std::process::id(),
        STAGED.fetch_add(1, Ordering::Relaxed),
        id.0
    )
}

fn timed<T>(
    stage: &'static str,
    limit: Option<Duration>,
    f: impl FnOnce() -> StrobeResult<T>,
) -> StrobeResult<T> {
    let started = Instant::now();
    let out = f()?;
    if let Some(limit) = limit
        && started.elapsed() > limit
    {
        return Err(StrobeError::Timeout {
            stage,
            limit_ms: limit.as_millis(),
        });
    }
    Ok(out)
}

fn build_thread_pool(threads: usize) -> StrobeResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("strobe-worker-{i}"))
        .build()
        .map_err(|e| StrobeError::validation(format!("failed to build rayon thread pool: {e}")))
}
