//! Freehand ink: pen and highlighter.

use super::{DrawOp, ToolShape};
use crate::annotation::{Annotation, AnnotationPoint};
use crate::geometry;

/// Smoothed freehand stroke.
#[derive(Debug, Clone, Copy)]
pub struct FreehandShape {
    /// Stroke width = size * this.
    width_factor: f64,
    round: bool,
}

impl FreehandShape {
    pub const fn pen() -> Self {
        Self {
            width_factor: 1.0,
            round: true,
        }
    }

    /// Wide, flat-ended marker.
    pub const fn highlighter() -> Self {
        Self {
            width_factor: 3.0,
            round: false,
        }
    }
}

impl ToolShape for FreehandShape {
    fn draw(&self, annotation: &Annotation) -> Vec<DrawOp> {
        if annotation.points.is_empty() {
            return Vec::new();
        }
        // Pressure scales the base width; mean pressure keeps one path per stroke.
        let pressure = annotation.points.iter().map(|p| p.pressure).sum::<f64>() / annotation.points.len() as f64;
        let pressure = if pressure > 0.0 { pressure } else { 1.0 };
        vec![DrawOp::Stroke {
            path: geometry::smooth_path(&annotation.positions()),
            width: annotation.size * self.width_factor * pressure.clamp(0.25, 1.5),
            color: annotation.color,
            opacity: annotation.opacity,
            dashed: false,
            round: self.round,
        }]
    }

    fn commit_shape(&self, points: Vec<AnnotationPoint>) -> Option<Vec<AnnotationPoint>> {
        (points.len() >= 2).then_some(points)
    }
}
