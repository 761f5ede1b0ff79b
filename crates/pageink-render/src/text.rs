//! Label text outlines from the bundled DejaVu Sans face.

use ab_glyph::{Font, FontRef, GlyphId, OutlineCurve, ScaleFont};
use kurbo::{BezPath, Point};

const FONT_DATA: &[u8] = include_bytes!("../fonts/DejaVuSans.ttf");

/// The face measurement labels are set in.
#[derive(Debug, Clone)]
pub(crate) struct LabelFont {
    font: FontRef<'static>,
}

impl LabelFont {
    /// Parse the bundled face. `None` when it cannot be read; labels are then skipped.
    pub(crate) fn load() -> Option<Self> {
        match FontRef::try_from_slice(FONT_DATA) {
            Ok(font) => Some(Self { font }),
            Err(e) => {
                log::warn!("label font unavailable: {e}");
                None
            }
        }
    }

    /// Glyph outlines of `text` at `size` px, centred on `center`.
    ///
    /// Characters the face lacks are skipped.
    pub(crate) fn text_path(&self, text: &str, center: Point, size: f64) -> BezPath {
        let mut path = BezPath::new();
        if !(size.is_finite() && size > 0.0) {
            return path;
        }
        let scaled = self.font.as_scaled(size as f32);
        let glyphs: Vec<GlyphId> = text
            .chars()
            .map(|c| self.font.glyph_id(c))
            .filter(|id| id.0 != 0)
            .collect();

        let mut advances = Vec::with_capacity(glyphs.len());
        let mut width = 0.0f32;
        let mut prev: Option<GlyphId> = None;
        for &id in &glyphs {
            if let Some(prev) = prev {
                width += scaled.kern(prev, id);
            }
            advances.push(width);
            width += scaled.h_advance(id);
            prev = Some(id);
        }

        let left = center.x - f64::from(width) / 2.0;
        let baseline = center.y + f64::from(scaled.ascent() + scaled.descent()) / 2.0;
        let (sx, sy) = (f64::from(scaled.h_scale_factor()), f64::from(scaled.v_scale_factor()));

        for (&id, &x) in glyphs.iter().zip(&advances) {
            let Some(outline) = self.font.outline(id) else {
                continue;
            };
            let origin = Point::new(left + f64::from(x), baseline);
            // Font units are y-up.
            let to_px = |p: ab_glyph::Point| Point::new(origin.x + f64::from(p.x) * sx, origin.y - f64::from(p.y) * sy);
            let mut pen: Option<Point> = None;
            for curve in &outline.curves {
                let start = match curve {
                    OutlineCurve::Line(p0, _) | OutlineCurve::Quad(p0, _, _) | OutlineCurve::Cubic(p0, _, _, _) => {
                        to_px(*p0)
                    }
                };
                if pen != Some(start) {
                    if pen.is_some() {
                        path.close_path();
                    }
                    path.move_to(start);
                }
                let end = match curve {
                    OutlineCurve::Line(_, p1) => {
                        let p1 = to_px(*p1);
                        path.line_to(p1);
                        p1
                    }
                    OutlineCurve::Quad(_, c, p1) => {
                        let p1 = to_px(*p1);
                        path.quad_to(to_px(*c), p1);
                        p1
                    }
                    OutlineCurve::Cubic(_, c0, c1, p1) => {
                        let p1 = to_px(*p1);
                        path.curve_to(to_px(*c0), to_px(*c1), p1);
                        p1
                    }
                };
                pen = Some(end);
            }
            if pen.is_some() {
                path.close_path();
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Shape;

    #[test]
    fn test_bundled_font_loads() {
        assert!(LabelFont::load().is_some());
    }

    #[test]
    fn test_text_path_is_centred() {
        let font = LabelFont::load().unwrap();
        let bounds = font.text_path("88", Point::new(100.0, 50.0), 20.0).bounding_box();
        assert!((bounds.center().x - 100.0).abs() < 2.0);
        assert!((bounds.center().y - 50.0).abs() < 3.0);
        assert!(bounds.height() > 10.0 && bounds.height() < 20.0);
    }

    #[test]
    fn test_wider_text_is_wider() {
        let font = LabelFont::load().unwrap();
        let one = font.text_path("4", Point::ZERO, 16.0).bounding_box();
        let three = font.text_path("45°", Point::ZERO, 16.0).bounding_box();
        assert!(three.width() > one.width() * 2.0);
    }

    #[test]
    fn test_empty_and_missing_glyphs() {
        let font = LabelFont::load().unwrap();
        assert!(font.text_path("", Point::ZERO, 12.0).elements().is_empty());
        assert!(font.text_path("\u{4e00}", Point::ZERO, 12.0).elements().is_empty());
        assert!(font.text_path("12", Point::ZERO, 0.0).elements().is_empty());
    }
}
