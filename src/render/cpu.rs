use kurbo::Shape;

use crate::foundation::color::Color;
use crate::foundation::core::{Affine, BezPath, Resolution};
use crate::foundation::error::{StrobeError, StrobeResult};
use crate::render::backend::{FrameRGBA, FrameRenderer, RenderSettings};
use crate::scene::graph::{NodeKind, PropValue};
use crate::scene::snapshot::{FrameSnapshot, NodeSnapshot};

const PATH_TOLERANCE: f64 = 0.1;
const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// CPU rasterizer powered by `vello_cpu`.
///
/// Scene coordinates have their origin at the canvas centre, y pointing down. Supported
/// drawables are rects, circles and spline paths; text nodes are skipped.
pub struct CpuRenderer {
    settings: RenderSettings,
    ctx: Option<vello_cpu::RenderContext>,
}

impl CpuRenderer {
    /// Create a renderer with `settings`.
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            ctx: None,
        }
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&RenderSettings, &mut vello_cpu::RenderContext) -> StrobeResult<R>,
    ) -> StrobeResult<R> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(&self.settings, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }
}

impl FrameRenderer for CpuRenderer {
    fn render(
        &mut self,
        snapshot: &FrameSnapshot,
        resolution: Resolution,
    ) -> StrobeResult<FrameRGBA> {
        let width: u16 = resolution.width.try_into().map_err(|_| {
            StrobeError::render(format!("frame width {} exceeds u16", resolution.width))
        })?;
        let height: u16 = resolution.height.try_into().map_err(|_| {
            StrobeError::render(format!("frame height {} exceeds u16", resolution.height))
        })?;
        let centre = Affine::translate((
            f64::from(resolution.width) / 2.0,
            f64::from(resolution.height) / 2.0,
        ));

        self.with_ctx_mut(width, height, |settings, ctx| {
            if let Some([r, g, b, a]) = settings.clear_rgba {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(width),
                    f64::from(height),
                ));
            }

            for node in &snapshot.nodes {
                draw_node(ctx, node, centre)?;
            }

            let mut pixmap = vello_cpu::Pixmap::new(width, height);
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(FrameRGBA {
                width: resolution.width,
                height: resolution.height,
                data: pixmap.data_as_u8_slice().to_vec(),
                premultiplied: true,
            })
        })
    }
}

fn draw_node(
    ctx: &mut vello_cpu::RenderContext,
    node: &NodeSnapshot,
    centre: Affine,
) -> StrobeResult<()> {
    let geometry = match node.kind {
        NodeKind::Group => return Ok(()),
        NodeKind::Text => {
            tracing::trace!(node = %node.name, "text nodes are not rasterized");
            return Ok(());
        }
        NodeKind::Rect => {
            let w = node.number_or("width", 0.0)?;
            let h = node.number_or("height", 0.0)?;
            let r = node.number_or("radius", 0.0)?;
            kurbo::RoundedRect::new(-w / 2.0, -h / 2.0, w / 2.0, h / 2.0, r)
                .to_path(PATH_TOLERANCE)
        }
        NodeKind::Circle => {
            let r = node.number_or("radius", 0.0)?;
            kurbo::Circle::new((0.0, 0.0), r).to_path(PATH_TOLERANCE)
        }
        NodeKind::Spline => match node.prop("path") {
            Some(PropValue::Path(p)) => p.clone(),
            _ => {
                return Err(StrobeError::render(format!(
                    "spline node '{}' has no path",
                    node.name
                )));
            }
        },
    };

    let fill = color_prop(node, "fill")?;
    let mut stroke = color_prop(node, "stroke")?;
    if node.kind == NodeKind::Spline && fill.is_none() && stroke.is_none() {
        stroke = Some(Color::WHITE);
    }
    if (fill.is_none() && stroke.is_none()) || node.opacity <= 0.0 {
        return Ok(());
    }

    let path = bezpath_to_cpu(&geometry);
    ctx.set_transform(affine_to_cpu(centre * node.world));
    let opacity = node.opacity as f32;
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    if let Some(c) = fill {
        ctx.set_paint(color_to_cpu(c));
        ctx.fill_path(&path);
    }
    if let Some(c) = stroke {
        let width = node.number_or("line_width", DEFAULT_LINE_WIDTH)?;
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
        ctx.set_paint(color_to_cpu(c));
        ctx.stroke_path(&path);
    }
    if opacity < 1.0 {
        ctx.pop_layer();
    }
    Ok(())
}

fn color_prop(node: &NodeSnapshot, name: &str) -> StrobeResult<Option<Color>> {
    match node.prop(name) {
        None => Ok(None),
        Some(PropValue::Color(c)) => Ok(Some(*c)),
        Some(PropValue::Text(s)) => Color::parse(s).map(Some),
        Some(other) => Err(StrobeError::validation(format!(
            "node '{}': property '{name}' must be a color, got {}",
            node.name,
            other.type_name()
        ))),
    }
}

fn color_to_cpu(c: Color) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_rgba8();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
