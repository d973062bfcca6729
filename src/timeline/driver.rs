use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{FrameIndex, Fps};
use crate::foundation::error::{StrobeError, StrobeResult};
use crate::signal::handle::Signal;
use crate::signal::runtime::Runtime;
use crate::timeline::thread::{BoxThread, Thread, ThreadCtx, resume_in_order};

/// Lifecycle of a [`TimelineDriver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum DriverState {
    /// Created, not resumed yet.
    Idle,
    /// Producing frames.
    Running,
    /// Every frame has been produced.
    Completed,
    /// Stopped early.
    Cancelled,
}

/// One produced frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    /// Frame index, starting at 0.
    pub index: FrameIndex,
    /// Master time written for this frame.
    pub time_secs: f64,
}

/// Result of one [`TimelineDriver::resume`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// A frame was produced; the caller renders it, then resumes again.
    Frame(FrameTick),
    /// The timeline has completed.
    Done,
}

/// Steps a master time signal across a fixed duration, one frame per resume.
///
/// Frame `i` has time `i * den / num`. The number of frames is `floor(duration * fps)`.
pub struct TimelineDriver {
    runtime: Runtime,
    time: Signal<f64>,
    duration_secs: f64,
    fps: Fps,
    total_frames: u64,
    next: u64,
    state: DriverState,
    threads: Vec<BoxThread>,
    cancel: Option<CancelToken>,
}

impl std::fmt::Debug for TimelineDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineDriver")
            .field("duration_secs", &self.duration_secs)
            .field("fps", &self.fps)
            .field("total_frames", &self.total_frames)
            .field("next", &self.next)
            .field("state", &self.state)
            .field("threads", &self.threads.len())
            .finish()
    }
}

impl TimelineDriver {
    /// Create a driver writing frame times into the `time` source signal.
    pub fn new(
        runtime: Runtime,
        time: Signal<f64>,
        duration_secs: f64,
        fps: Fps,
    ) -> StrobeResult<Self> {
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(StrobeError::validation(format!(
                "timeline duration must be finite and >= 0, got {duration_secs}"
            )));
        }
        if fps.num == 0 || fps.den == 0 {
            return Err(StrobeError::validation("timeline fps must be non-zero"));
        }
        Ok(Self {
            runtime,
            time,
            duration_secs,
            fps,
            total_frames: fps.secs_to_frames_floor(duration_secs),
            next: 0,
            state: DriverState::Idle,
            threads: Vec::new(),
            cancel: None,
        })
    }

    /// Poll `token` at every resume.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Register a sub-timeline; it is resumed after those registered before it.
    pub fn spawn(&mut self, thread: impl Thread + 'static) {
        self.threads.push(Box::new(thread));
    }

    /// Register an already boxed sub-timeline.
    pub fn spawn_boxed(&mut self, thread: BoxThread) {
        self.threads.push(thread);
    }

    /// Produce the next frame.
    pub fn resume(&mut self) -> StrobeResult<Step> {
        match self.state {
            DriverState::Cancelled => return Err(StrobeError::Cancelled),
            DriverState::Completed => return Ok(Step::Done),
            DriverState::Idle => {
                self.state = DriverState::Running;
                tracing::debug!(
                    frames = self.total_frames,
                    fps = self.fps.as_f64(),
                    "timeline started"
                );
            }
            DriverState::Running => {}
        }

        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            self.cancel();
            return Err(StrobeError::Cancelled);
        }

        if self.next >= self.total_frames {
            self.state = DriverState::Completed;
            self.threads.clear();
            tracing::debug!(frames = self.total_frames, "timeline completed");
            return Ok(Step::Done);
        }

        let index = FrameIndex(self.next);
        let time_secs = self.fps.frames_to_secs(self.next);
        self.time.write(time_secs)?;
        self.runtime.advance_tick();

        let ctx = ThreadCtx {
            frame: index,
            time_secs,
            fps: self.fps,
            runtime: &self.runtime,
        };
        resume_in_order(&mut self.threads, &ctx)?;

        self.next += 1;
        Ok(Step::Frame(FrameTick { index, time_secs }))
    }

    /// Drive every remaining frame, calling `on_frame` after each one is set up.
    ///
    /// Returns the number of frames produced by this call.
    pub fn run<F>(&mut self, mut on_frame: F) -> StrobeResult<u64>
    where
        F: FnMut(FrameTick) -> StrobeResult<()>,
    {
        let mut produced = 0;
        while let Step::Frame(tick) = self.resume()? {
            on_frame(tick)?;
            produced += 1;
        }
        Ok(produced)
    }

    /// Stop early and leave every signal re-readable.
    pub fn cancel(&mut self) {
        if matches!(self.state, DriverState::Completed | DriverState::Cancelled) {
            return;
        }
        self.state = DriverState::Cancelled;
        self.threads.clear();
        self.runtime.invalidate_all();
        tracing::debug!(at_frame = self.next, "timeline cancelled");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Total frames the timeline produces.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Index of the next frame to produce.
    pub fn next_frame(&self) -> FrameIndex {
        FrameIndex(self.next)
    }

    /// Configured duration.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Configured frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Master time signal.
    pub fn time(&self) -> &Signal<f64> {
        &self.time
    }

    /// Number of sub-timelines still active.
    pub fn active_threads(&self) -> usize {
        self.threads.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/driver.rs"]
mod tests;
