//! Axis-aligned rectangle outline from two opposite corners.

use super::{DrawOp, ToolShape};
use crate::annotation::Annotation;
use crate::geometry;
use kurbo::{Point, Rect, Shape};

#[derive(Debug, Clone, Copy)]
pub struct RectangleShape;

fn as_rect(annotation: &Annotation) -> Option<Rect> {
    Some(Rect::from_points(annotation.first_pos()?, annotation.last_pos()?))
}

impl ToolShape for RectangleShape {
    fn draw(&self, annotation: &Annotation) -> Vec<DrawOp> {
        let Some(rect) = as_rect(annotation) else {
            return Vec::new();
        };
        vec![DrawOp::Stroke {
            path: rect.to_path(geometry::PATH_TOLERANCE),
            width: annotation.size,
            color: annotation.color,
            opacity: annotation.opacity,
            dashed: false,
            round: false,
        }]
    }

    fn hit_test(&self, annotation: &Annotation, center: Point, radius: f64) -> bool {
        as_rect(annotation).is_some_and(|rect| geometry::rect_outline_hit(rect, center, radius))
    }
}
