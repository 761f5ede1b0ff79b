//! Ruler: a measured straight line with tick marks.

use super::{DrawOp, ToolShape};
use crate::annotation::Annotation;
use crate::geometry;
use kurbo::{BezPath, Vec2};

/// Distance between ruler ticks, in raster units.
pub const TICK_SPACING: f64 = 10.0;

#[derive(Debug, Clone, Copy)]
pub struct RulerShape;

impl ToolShape for RulerShape {
    fn draw(&self, annotation: &Annotation) -> Vec<DrawOp> {
        let (Some(a), Some(b)) = (annotation.first_pos(), annotation.last_pos()) else {
            return Vec::new();
        };
        let mut ops = vec![DrawOp::stroke(annotation, geometry::line_path(a, b))];

        let ticks = geometry::ruler_ticks(a, b, TICK_SPACING, annotation.size * 2.0 + 2.0);
        if !ticks.is_empty() {
            let mut path = BezPath::new();
            for (from, to) in ticks {
                path.move_to(from);
                path.line_to(to);
            }
            ops.push(DrawOp::Stroke {
                path,
                width: (annotation.size * 0.5).max(1.0),
                color: annotation.color,
                opacity: annotation.opacity,
                dashed: false,
                round: false,
            });
        }

        let length = a.distance(b);
        if length >= 1.0 {
            let mid = a.midpoint(b);
            let dir = (b - a) / length;
            let offset = Vec2::new(dir.y, -dir.x) * (annotation.size * 2.0 + 12.0);
            ops.push(DrawOp::label(annotation, mid + offset, format!("{length:.0}")));
        }
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationPoint, InkColor, ToolKind};

    #[test]
    fn test_length_label() {
        let ann = Annotation::new(
            ToolKind::Ruler,
            InkColor::black(),
            1.0,
            1.0,
            vec![AnnotationPoint::new(0.0, 0.0), AnnotationPoint::new(30.0, 40.0)],
        );
        let label = RulerShape.draw(&ann).into_iter().find_map(|op| match op {
            DrawOp::Label(label) => Some(label.text),
            _ => None,
        });
        assert_eq!(label.as_deref(), Some("50"));
    }

    #[test]
    fn test_commit_keeps_endpoints() {
        let pts: Vec<_> = (0..4).map(|i| AnnotationPoint::new(i as f64, i as f64)).collect();
        let committed = RulerShape.commit_shape(pts).unwrap();
        assert_eq!(committed.len(), 2);
        assert!((committed[1].x - 3.0).abs() < f64::EPSILON);
    }
}
