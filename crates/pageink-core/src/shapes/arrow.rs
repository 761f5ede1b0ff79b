//! Straight arrow with an open two-barb head.

use super::{DrawOp, ToolShape};
use crate::annotation::Annotation;
use crate::geometry;
use kurbo::BezPath;

#[derive(Debug, Clone, Copy)]
pub struct ArrowShape;

impl ArrowShape {
    pub fn head_size(size: f64) -> f64 {
        (size * 4.0).max(10.0)
    }
}

impl ToolShape for ArrowShape {
    fn draw(&self, annotation: &Annotation) -> Vec<DrawOp> {
        let (Some(tail), Some(tip)) = (annotation.first_pos(), annotation.last_pos()) else {
            return Vec::new();
        };
        let mut ops = vec![DrawOp::stroke(annotation, geometry::line_path(tail, tip))];
        if let Some((left, right)) = geometry::arrow_head(tail, tip, Self::head_size(annotation.size)) {
            let mut head = BezPath::new();
            head.move_to(left);
            head.line_to(tip);
            head.line_to(right);
            ops.push(DrawOp::stroke(annotation, head));
        }
        ops
    }
}
