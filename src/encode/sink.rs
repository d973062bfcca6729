use std::path::PathBuf;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{StrobeError, StrobeResult};
use crate::render::backend::FrameRGBA;

/// Configuration provided to a [`MediaEncoder`] when a job's encode session opens.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Destination file (or directory, for image sequences).
    pub out_path: PathBuf,
    /// Local audio file muxed alongside the frames. Never changes the video duration.
    pub audio: Option<PathBuf>,
}

/// Encoder contract for one job.
///
/// Ordering contract: `begin` once, then `push_frame` in strictly increasing [`FrameIndex`]
/// order, then exactly one of `finish` or `abort`.
pub trait MediaEncoder {
    /// Open the encode session.
    fn begin(&mut self, cfg: &EncodeConfig) -> StrobeResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StrobeResult<()>;
    /// Finalize the output and return its path.
    fn finish(&mut self) -> StrobeResult<PathBuf>;
    /// Tear down after a failure; must not panic and may be called in any state.
    fn abort(&mut self);
}

/// Creates one encoder per job; shared between workers.
pub trait EncoderFactory: Send + Sync {
    /// Create a fresh encoder.
    fn create(&self) -> StrobeResult<Box<dyn MediaEncoder>>;
}

/// Checks the ordering contract shared by the built-in encoders.
#[derive(Debug, Default, Clone)]
pub(crate) struct FrameOrder {
    last: Option<FrameIndex>,
}

impl FrameOrder {
    pub(crate) fn check(&mut self, idx: FrameIndex) -> StrobeResult<()> {
        if let Some(last) = self.last
            && idx.0 <= last.0
        {
            return Err(StrobeError::encode(format!(
                "out-of-order frame index {} after {}",
                idx.0, last.0
            )));
        }
        self.last = Some(idx);
        Ok(())
    }
}

pub(crate) fn check_frame_size(cfg: &EncodeConfig, frame: &FrameRGBA) -> StrobeResult<()> {
    if frame.width != cfg.width || frame.height != cfg.height {
        return Err(StrobeError::encode(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, cfg.width, cfg.height
        )));
    }
    if frame.data.len() != cfg.width as usize * cfg.height as usize * 4 {
        return Err(StrobeError::encode(
            "frame.data size mismatch with width*height*4",
        ));
    }
    Ok(())
}

/// In-memory encoder for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemoryEncoder {
    cfg: Option<EncodeConfig>,
    order: FrameOrder,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    finished: bool,
    aborted: bool,
}

impl InMemoryEncoder {
    /// Create a new in-memory encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&EncodeConfig> {
        self.cfg.as_ref()
    }

    /// Captured frames in timeline order.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Return `true` once `finish` succeeded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Return `true` once `abort` was called.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl MediaEncoder for InMemoryEncoder {
    fn begin(&mut self, cfg: &EncodeConfig) -> StrobeResult<()> {
        self.cfg = Some(cfg.clone());
        self.order = FrameOrder::default();
        self.frames.clear();
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StrobeResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StrobeError::encode("encoder not started"))?;
        check_frame_size(cfg, frame)?;
        self.order.check(idx)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn finish(&mut self) -> StrobeResult<PathBuf> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StrobeError::encode("encoder not started"))?;
        self.finished = true;
        Ok(cfg.out_path.clone())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
