use std::collections::VecDeque;

use crate::animation::ease::Ease;
use crate::animation::lerp::Lerp;
use crate::foundation::core::{FrameIndex, Fps};
use crate::foundation::error::{StrobeError, StrobeResult};
use crate::signal::handle::Signal;
use crate::signal::runtime::Runtime;

/// Outcome of resuming a sub-timeline for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadState {
    /// Wants to be resumed again on the next frame.
    Yielded,
    /// Done; the driver drops it.
    Finished,
}

/// Frame context handed to every sub-timeline.
#[derive(Clone, Copy)]
pub struct ThreadCtx<'a> {
    /// Frame being produced.
    pub frame: FrameIndex,
    /// Master time of that frame.
    pub time_secs: f64,
    /// Frame rate of the driver.
    pub fps: Fps,
    /// Runtime owning the scene signals.
    pub runtime: &'a Runtime,
}

/// Cooperative sub-timeline resumed once per frame by the driver.
pub trait Thread {
    /// Debug name used in logs.
    fn name(&self) -> &str {
        "thread"
    }

    /// Run this frame's slice of work.
    fn resume(&mut self, ctx: &ThreadCtx<'_>) -> StrobeResult<ThreadState>;
}

/// Boxed sub-timeline.
pub type BoxThread = Box<dyn Thread>;

// Seconds elapsed since `start`, measured on the frame grid.
fn elapsed_secs(start: &mut Option<u64>, ctx: &ThreadCtx<'_>) -> f64 {
    let start = *start.get_or_insert(ctx.frame.0);
    ctx.fps.frames_to_secs(ctx.frame.0.saturating_sub(start))
}

/// Tweens a source signal from one value to another.
///
/// The first resume captures the start frame. The final value is written on the frame where
/// the duration has elapsed.
pub struct Tween<T> {
    target: Signal<T>,
    from: T,
    to: T,
    duration_secs: f64,
    ease: Ease,
    start: Option<u64>,
}

impl<T: Lerp + Clone + 'static> Tween<T> {
    /// Tween `target` from `from` to `to` over `duration_secs`.
    pub fn new(
        target: Signal<T>,
        from: T,
        to: T,
        duration_secs: f64,
        ease: Ease,
    ) -> StrobeResult<Self> {
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(StrobeError::validation(format!(
                "tween duration must be finite and >= 0, got {duration_secs}"
            )));
        }
        Ok(Self {
            target,
            from,
            to,
            duration_secs,
            ease,
            start: None,
        })
    }
}

impl<T: Lerp + Clone + 'static> Thread for Tween<T> {
    fn name(&self) -> &str {
        "tween"
    }

    fn resume(&mut self, ctx: &ThreadCtx<'_>) -> StrobeResult<ThreadState> {
        let elapsed = elapsed_secs(&mut self.start, ctx);
        if self.duration_secs <= 0.0 || elapsed >= self.duration_secs {
            self.target.write(self.to.clone())?;
            return Ok(ThreadState::Finished);
        }
        let p = self.ease.apply(elapsed / self.duration_secs);
        self.target.write(T::lerp(&self.from, &self.to, p))?;
        Ok(ThreadState::Yielded)
    }
}

/// Waits a number of seconds.
#[derive(Clone, Debug)]
pub struct WaitFor {
    secs: f64,
    start: Option<u64>,
}

impl WaitFor {
    /// Wait `secs` seconds from the first resume.
    pub fn new(secs: f64) -> Self {
        Self {
            secs: secs.max(0.0),
            start: None,
        }
    }
}

impl Thread for WaitFor {
    fn name(&self) -> &str {
        "wait"
    }

    fn resume(&mut self, ctx: &ThreadCtx<'_>) -> StrobeResult<ThreadState> {
        if elapsed_secs(&mut self.start, ctx) >= self.secs {
            Ok(ThreadState::Finished)
        } else {
            Ok(ThreadState::Yielded)
        }
    }
}

/// Runs children back to back.
///
/// When a child finishes, the next one starts within the same frame.
#[derive(Default)]
pub struct Sequence {
    children: VecDeque<BoxThread>,
}

impl Sequence {
    /// Sequence over `children`, in order.
    pub fn new(children: impl IntoIterator<Item = BoxThread>) -> Self {
        Self {
            children: children.into_iter().collect(),
        }
    }

    /// Append a child.
    pub fn then(mut self, child: impl Thread + 'static) -> Self {
        self.children.push_back(Box::new(child));
        self
    }
}

impl Thread for Sequence {
    fn name(&self) -> &str {
        "sequence"
    }

    fn resume(&mut self, ctx: &ThreadCtx<'_>) -> StrobeResult<ThreadState> {
        while let Some(current) = self.children.front_mut() {
            match current.resume(ctx)? {
                ThreadState::Yielded => return Ok(ThreadState::Yielded),
                ThreadState::Finished => {
                    self.children.pop_front();
                }
            }
        }
        Ok(ThreadState::Finished)
    }
}

/// Runs children concurrently, resumed in order, until all have finished.
#[derive(Default)]
pub struct All {
    children: Vec<BoxThread>,
}

impl All {
    /// Join over `children`.
    pub fn new(children: impl IntoIterator<Item = BoxThread>) -> Self {
        Self {
            children: children.into_iter().collect(),
        }
    }

    /// Add a child.
    pub fn with(mut self, child: impl Thread + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }
}

impl Thread for All {
    fn name(&self) -> &str {
        "all"
    }

    fn resume(&mut self, ctx: &ThreadCtx<'_>) -> StrobeResult<ThreadState> {
        resume_in_order(&mut self.children, ctx)?;
        if self.children.is_empty() {
            Ok(ThreadState::Finished)
        } else {
            Ok(ThreadState::Yielded)
        }
    }
}

/// Closure-backed sub-timeline.
pub struct FnThread<F> {
    name: String,
    f: F,
}

impl<F> FnThread<F>
where
    F: FnMut(&ThreadCtx<'_>) -> StrobeResult<ThreadState>,
{
    /// Wrap `f` as a sub-timeline.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Thread for FnThread<F>
where
    F: FnMut(&ThreadCtx<'_>) -> StrobeResult<ThreadState>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(&mut self, ctx: &ThreadCtx<'_>) -> StrobeResult<ThreadState> {
        (self.f)(ctx)
    }
}

/// Resume each thread once in order, dropping the finished ones.
pub(crate) fn resume_in_order(
    threads: &mut Vec<BoxThread>,
    ctx: &ThreadCtx<'_>,
) -> StrobeResult<()> {
    let mut i = 0;
    while i < threads.len() {
        match threads[i].resume(ctx)? {
            ThreadState::Yielded => i += 1,
            ThreadState::Finished => {
                let done = threads.remove(i);
                tracing::trace!(thread = done.name(), frame = ctx.frame.0, "thread finished");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/thread.rs"]
mod tests;
