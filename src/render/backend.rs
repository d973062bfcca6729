use crate::foundation::core::Resolution;
use crate::foundation::error::StrobeResult;
use crate::scene::snapshot::FrameSnapshot;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha** by default; the flag makes this explicit at API
/// boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent frame.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
            premultiplied: true,
        }
    }

    /// RGBA quadruple at `(x, y)`, if inside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Turns one frame snapshot into pixels.
///
/// Called once per frame, in frame order, on the worker that owns the job.
pub trait FrameRenderer {
    /// Rasterize `snapshot` at `resolution`.
    fn render(&mut self, snapshot: &FrameSnapshot, resolution: Resolution)
    -> StrobeResult<FrameRGBA>;
}

/// Creates one renderer per job; shared between workers.
pub trait RendererFactory: Send + Sync {
    /// Create a fresh renderer.
    fn create(&self) -> StrobeResult<Box<dyn FrameRenderer>>;
}

/// Backend-agnostic settings.
#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    /// If set, the canvas is filled with this straight-alpha RGBA8 color before drawing.
    pub clear_rgba: Option<[u8; 4]>,
}

/// Factory for [`crate::CpuRenderer`].
#[derive(Clone, Debug, Default)]
pub struct CpuRendererFactory {
    settings: RenderSettings,
}

impl CpuRendererFactory {
    /// Factory producing renderers with `settings`.
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }
}

impl RendererFactory for CpuRendererFactory {
    fn create(&self) -> StrobeResult<Box<dyn FrameRenderer>> {
        Ok(Box::new(crate::render::cpu::CpuRenderer::new(
            self.settings.clone(),
        )))
    }
}
