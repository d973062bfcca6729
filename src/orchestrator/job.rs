use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::foundation::core::{Fps, Resolution};
use crate::foundation::error::{FaultKind, StrobeError, StrobeResult};
use crate::scene::descriptor::SceneDescriptor;

/// Position of a job in the submitted batch.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct JobId(pub usize);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// One render job: a scene rendered to one output file.
#[derive(Clone)]
pub struct JobSpec {
    /// Display name used in logs and reports.
    pub name: String,
    /// Scene recipe, instantiated inside the worker.
    pub scene: Arc<dyn SceneDescriptor>,
    /// Output file (or directory, for image sequences).
    pub out_path: PathBuf,
    /// Output canvas size.
    pub resolution: Resolution,
    /// Frame rate.
    pub fps: Fps,
    /// Timeline duration in seconds.
    pub duration_secs: f64,
    /// Asset name of the audio track, resolved through the orchestrator's resolver.
    pub audio: Option<String>,
}

impl std::fmt::Debug for JobSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSpec")
            .field("name", &self.name)
            .field("scene", &self.scene.name())
            .field("out_path", &self.out_path)
            .field("resolution", &self.resolution)
            .field("fps", &self.fps)
            .field("duration_secs", &self.duration_secs)
            .field("audio", &self.audio)
            .finish()
    }
}

impl JobSpec {
    /// Default frame rate.
    pub const DEFAULT_FPS: u32 = 30;
    /// Default duration in seconds.
    pub const DEFAULT_DURATION_SECS: f64 = 6.0;

    /// Job rendering `scene` to `out_path` at 1280x720, 30 fps, for 6 seconds.
    pub fn new(scene: Arc<dyn SceneDescriptor>, out_path: impl Into<PathBuf>) -> Self {
        Self {
            name: scene.name().to_owned(),
            scene,
            out_path: out_path.into(),
            resolution: Resolution::default(),
            fps: Fps {
                num: Self::DEFAULT_FPS,
                den: 1,
            },
            duration_secs: Self::DEFAULT_DURATION_SECS,
            audio: None,
        }
    }

    /// Override the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the resolution.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Override the frame rate.
    pub fn with_fps(mut self, fps: Fps) -> Self {
        self.fps = fps;
        self
    }

    /// Override the duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Attach an audio asset.
    pub fn with_audio(mut self, name: impl Into<String>) -> Self {
        self.audio = Some(name.into());
        self
    }

    /// Check the fields that do not depend on the scene itself.
    pub fn validate(&self) -> StrobeResult<()> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(StrobeError::validation(format!(
                "job '{}': resolution must be non-zero",
                self.name
            )));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(StrobeError::validation(format!(
                "job '{}': fps must be non-zero",
                self.name
            )));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(StrobeError::validation(format!(
                "job '{}': duration must be finite and > 0, got {}",
                self.name, self.duration_secs
            )));
        }
        if self.out_path.as_os_str().is_empty() {
            return Err(StrobeError::validation(format!(
                "job '{}': output path must be non-empty",
                self.name
            )));
        }
        Ok(())
    }
}

/// Lifecycle of a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum JobState {
    /// Waiting for a worker slot.
    Queued,
    /// Driving the timeline and rendering frames.
    Rendering,
    /// Finalizing the output.
    Encoding,
    /// Output written.
    Done,
    /// Stopped by a fault or cancellation.
    Failed,
}

impl JobState {
    /// Return `true` for `Done` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Final result of one job.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    /// The output was written to `path`.
    Done {
        /// Output path returned by the encoder.
        path: PathBuf,
    },
    /// The job failed; siblings are unaffected.
    Failed {
        /// Fault classification.
        kind: FaultKind,
        /// Human-readable diagnostic.
        message: String,
    },
}

impl JobOutcome {
    pub(crate) fn from_error(err: &StrobeError) -> Self {
        Self::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Output path, if the job succeeded.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Done { path } => Some(path),
            Self::Failed { .. } => None,
        }
    }

    /// Fault kind, if the job failed.
    pub fn fault(&self) -> Option<FaultKind> {
        match self {
            Self::Done { .. } => None,
            Self::Failed { kind, .. } => Some(*kind),
        }
    }
}

/// Per-job entry of a [`RenderReport`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct JobReport {
    /// Job id (input position).
    pub id: JobId,
    /// Job display name.
    pub name: String,
    /// Final outcome.
    pub outcome: JobOutcome,
    /// Frames handed to the encoder.
    pub frames: u64,
    /// Wall-clock time spent in the worker.
    pub elapsed: Duration,
}

/// Result of [`crate::Orchestrator::run_jobs`], in input order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct RenderReport {
    /// One entry per submitted job, in submission order.
    pub jobs: Vec<JobReport>,
    /// Maximum number of jobs that held a worker slot at the same time.
    pub peak_parallelism: usize,
}

impl RenderReport {
    /// Jobs that produced an output.
    pub fn succeeded(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(|j| j.outcome.path().is_some())
    }

    /// Jobs that failed.
    pub fn failed(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(|j| j.outcome.fault().is_some())
    }

    /// Return `true` when every job succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.failed().next().is_none()
    }

    /// Multi-line human-readable summary.
    pub fn summary(&self) -> String {
        let ok = self.succeeded().count();
        let mut out = format!(
            "{ok}/{} jobs succeeded (peak parallelism {})\n",
            self.jobs.len(),
            self.peak_parallelism
        );
        for job in &self.jobs {
            let line = match &job.outcome {
                JobOutcome::Done { path } => format!(
                    "  [ok]   {} {}: {} ({} frames, {:.2}s)\n",
                    job.id,
                    job.name,
                    path.display(),
                    job.frames,
                    job.elapsed.as_secs_f64()
                ),
                JobOutcome::Failed { kind, message } => {
                    format!("  [fail] {} {}: {kind}: {message}\n", job.id, job.name)
                }
            };
            out.push_str(&line);
        }
        out
    }
}

/// Receives every job state transition. Called from worker threads.
pub trait JobObserver: Send + Sync {
    /// `id` entered `state`.
    fn on_transition(&self, id: JobId, name: &str, state: JobState);
}

impl<F> JobObserver for F
where
    F: Fn(JobId, &str, JobState) + Send + Sync,
{
    fn on_transition(&self, id: JobId, name: &str, state: JobState) {
        self(id, name, state)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrator/job.rs"]
mod tests;
