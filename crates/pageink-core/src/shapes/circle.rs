//! Circle family: compass (outline) and disk (filled).
//!
//! Both store `[center, edge]`; the radius is the distance between them.

use super::{DrawOp, ToolShape};
use crate::annotation::Annotation;
use crate::geometry;
use kurbo::Point;

/// Center and radius of a circle-family annotation.
pub fn center_radius(annotation: &Annotation) -> Option<(Point, f64)> {
    let center = annotation.first_pos()?;
    let edge = annotation.last_pos()?;
    Some((center, center.distance(edge)))
}

#[derive(Debug, Clone, Copy)]
pub struct CompassShape;

impl ToolShape for CompassShape {
    fn draw(&self, annotation: &Annotation) -> Vec<DrawOp> {
        match center_radius(annotation) {
            Some((center, radius)) if radius > 0.0 => {
                vec![DrawOp::stroke(annotation, geometry::circle_path(center, radius))]
            }
            _ => Vec::new(),
        }
    }

    fn hit_test(&self, annotation: &Annotation, center: Point, radius: f64) -> bool {
        center_radius(annotation)
            .is_some_and(|(c, r)| geometry::circle_outline_hit(c, r, center, radius))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiskShape;

impl ToolShape for DiskShape {
    fn draw(&self, annotation: &Annotation) -> Vec<DrawOp> {
        match center_radius(annotation) {
            Some((center, radius)) if radius > 0.0 => vec![DrawOp::Fill {
                path: geometry::circle_path(center, radius),
                color: annotation.color,
                opacity: annotation.opacity,
            }],
            _ => Vec::new(),
        }
    }

    fn hit_test(&self, annotation: &Annotation, center: Point, radius: f64) -> bool {
        center_radius(annotation).is_some_and(|(c, r)| geometry::disk_hit(c, r, center, radius))
    }
}
