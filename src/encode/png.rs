use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::sink::{
    EncodeConfig, EncoderFactory, FrameOrder, MediaEncoder, check_frame_size,
};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{StrobeError, StrobeResult};
use crate::render::backend::FrameRGBA;

/// Writes every frame as `frame_NNNNN.png` into the output directory.
///
/// Audio is ignored; an image sequence has no audio track.
#[derive(Debug, Default)]
pub struct PngSequenceEncoder {
    cfg: Option<EncodeConfig>,
    order: FrameOrder,
    written: u64,
}

impl PngSequenceEncoder {
    /// Create an idle encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames written so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl MediaEncoder for PngSequenceEncoder {
    fn begin(&mut self, cfg: &EncodeConfig) -> StrobeResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(StrobeError::validation(
                "png sequence width/height must be non-zero",
            ));
        }
        std::fs::create_dir_all(&cfg.out_path).with_context(|| {
            format!("failed to create output directory '{}'", cfg.out_path.display())
        })?;
        if cfg.audio.is_some() {
            tracing::debug!(out = %cfg.out_path.display(), "png sequence ignores audio");
        }
        self.cfg = Some(cfg.clone());
        self.order = FrameOrder::default();
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StrobeResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StrobeError::encode("png sequence encoder not started"))?;
        self.order.check(idx)?;
        check_frame_size(cfg, frame)?;
        write_png(&cfg.out_path.join(format!("frame_{:05}.png", idx.0)), frame)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> StrobeResult<PathBuf> {
        let cfg = self
            .cfg
            .take()
            .ok_or_else(|| StrobeError::encode("png sequence encoder not started"))?;
        Ok(cfg.out_path)
    }

    fn abort(&mut self) {
        // Already-written frames are left in place for inspection.
        self.cfg = None;
    }
}

/// Factory for [`PngSequenceEncoder`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PngSequenceEncoderFactory;

impl EncoderFactory for PngSequenceEncoderFactory {
    fn create(&self) -> StrobeResult<Box<dyn MediaEncoder>> {
        Ok(Box::new(PngSequenceEncoder::new()))
    }
}

/// Save `frame` as a straight-alpha RGBA PNG.
pub fn write_png(path: &Path, frame: &FrameRGBA) -> StrobeResult<()> {
    let data = if frame.premultiplied {
        unpremultiply(&frame.data)
    } else {
        frame.data.clone()
    };
    image::save_buffer_with_format(
        path,
        &data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| StrobeError::encode(format!("failed to write '{}': {e}", path.display())))
}

fn unpremultiply(src: &[u8]) -> Vec<u8> {
    let mut out = src.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    out
}
