//! CPU rasterizer backed by tiny-skia.

use crate::renderer::{RenderContext, Renderer, RendererError, RenderResult};
use crate::text::LabelFont;
use kurbo::{BezPath, PathEl};
use pageink_core::{DrawOp, InkColor, Label};
use peniko::Color;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, StrokeDash, Transform};

/// Dash pattern of guide strokes, in raster units.
const DASH: [f32; 2] = [6.0, 4.0];

/// Draws [`DrawOp`]s into a tiny-skia pixmap.
#[derive(Debug, Clone)]
pub struct RasterRenderer {
    font: Option<LabelFont>,
}

impl RasterRenderer {
    pub fn new() -> Self {
        Self { font: LabelFont::load() }
    }

    fn draw_op(&self, target: &mut Pixmap, op: &DrawOp, transform: Transform) {
        match op {
            DrawOp::Stroke {
                path,
                width,
                color,
                opacity,
                dashed,
                round,
            } => {
                let Some(path) = to_skia_path(path) else {
                    return;
                };
                let stroke = Stroke {
                    width: *width as f32,
                    line_cap: if *round { LineCap::Round } else { LineCap::Butt },
                    line_join: if *round { LineJoin::Round } else { LineJoin::Miter },
                    dash: if *dashed { StrokeDash::new(DASH.to_vec(), 0.0) } else { None },
                    ..Stroke::default()
                };
                target.stroke_path(&path, &paint(*color, *opacity), &stroke, transform, None);
            }
            DrawOp::Fill { path, color, opacity } => {
                if let Some(path) = to_skia_path(path) {
                    target.fill_path(&path, &paint(*color, *opacity), FillRule::Winding, transform, None);
                }
            }
            DrawOp::Label(label) => self.draw_label(target, label, transform),
        }
    }

    fn draw_label(&self, target: &mut Pixmap, label: &Label, transform: Transform) {
        let Some(font) = &self.font else {
            return;
        };
        let outline = font.text_path(&label.text, label.position, label.size);
        if let Some(path) = to_skia_path(&outline) {
            target.fill_path(&path, &paint(label.color, 1.0), FillRule::Winding, transform, None);
        }
    }
}

impl Default for RasterRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for RasterRenderer {
    fn render(&mut self, target: &mut Pixmap, ctx: &RenderContext) -> RenderResult<()> {
        if !(ctx.scale_factor.is_finite() && ctx.scale_factor > 0.0) {
            return Err(RendererError::RenderFailed(format!("invalid scale factor {}", ctx.scale_factor)));
        }
        let scale = ctx.scale_factor as f32;
        let transform = Transform::from_scale(scale, scale);
        for op in ctx.ops {
            self.draw_op(target, op, transform);
        }
        Ok(())
    }
}

/// Anti-aliased solid paint for an ink color at `opacity`.
pub(crate) fn paint(color: InkColor, opacity: f64) -> Paint<'static> {
    let color: Color = color.with_opacity(opacity);
    let rgba = color.to_rgba8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, rgba.a);
    paint.anti_alias = true;
    paint
}

/// Convert a kurbo path to a tiny-skia path. `None` for empty or degenerate paths.
pub(crate) fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => builder.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}
