//! Page-level grid overlay.

use super::{DrawOp, ToolShape};
use crate::annotation::{Annotation, AnnotationPoint};
use kurbo::{BezPath, Point};

/// Distance between grid lines, in raster units.
pub const GRID_SPACING: f64 = 25.0;

#[derive(Debug, Clone, Copy)]
pub struct GridShape;

impl ToolShape for GridShape {
    fn draw(&self, annotation: &Annotation) -> Vec<DrawOp> {
        let (Some(width), Some(height)) = (annotation.width, annotation.height) else {
            return Vec::new();
        };
        let (w, h) = (width as f64, height as f64);
        let mut path = BezPath::new();
        let mut x = GRID_SPACING;
        while x < w {
            path.move_to(Point::new(x, 0.0));
            path.line_to(Point::new(x, h));
            x += GRID_SPACING;
        }
        let mut y = GRID_SPACING;
        while y < h {
            path.move_to(Point::new(0.0, y));
            path.line_to(Point::new(w, y));
            y += GRID_SPACING;
        }
        if path.elements().is_empty() {
            return Vec::new();
        }
        vec![DrawOp::Stroke {
            path,
            width: annotation.size.clamp(0.5, 2.0),
            color: annotation.color,
            opacity: annotation.opacity * 0.35,
            dashed: false,
            round: false,
        }]
    }

    /// Grid overlays are immune to the eraser.
    fn hit_test(&self, _annotation: &Annotation, _center: Point, _radius: f64) -> bool {
        false
    }

    /// Grids are toggled, never committed from a draft.
    fn commit_shape(&self, _points: Vec<AnnotationPoint>) -> Option<Vec<AnnotationPoint>> {
        None
    }
}
