//! Two-step constructions: angle (two rays) and arc (radius + sweep).
//!
//! Committed points are `[anchor, first_end, second_end]`. Drafts may stop
//! after the first segment.

use super::{DrawOp, ToolShape};
use crate::annotation::{Annotation, AnnotationPoint};
use crate::geometry;
use kurbo::{Point, Vec2};

/// Radius of the angle marker arc drawn at the vertex.
const MARKER_RADIUS: f64 = 24.0;

/// Label for the angle between the two rays, in whole degrees.
pub fn angle_label(anchor: Point, first: Point, second: Point) -> String {
    format!("{:.0}°", geometry::angle_degrees(anchor, first, second))
}

/// Label for the signed arc sweep, in whole degrees.
pub fn sweep_label(anchor: Point, first: Point, second: Point) -> String {
    format!("{:.0}°", geometry::signed_sweep(anchor, first, second).to_degrees())
}

/// Hit test shared by both constructions: the brush lies on the circle of
/// radius `|first_end - anchor|` around the anchor.
fn defining_radius_hit(annotation: &Annotation, center: Point, radius: f64) -> bool {
    match annotation.points.as_slice() {
        [anchor, first, ..] => {
            let r = anchor.pos().distance(first.pos());
            geometry::circle_outline_hit(anchor.pos(), r, center, radius)
        }
        _ => false,
    }
}

fn commit_three(points: Vec<AnnotationPoint>) -> Option<Vec<AnnotationPoint>> {
    (points.len() == 3).then_some(points)
}

fn unit(v: Vec2) -> Vec2 {
    let len = v.hypot();
    if len < f64::EPSILON { Vec2::ZERO } else { v / len }
}

/// Place a label just outside `radius` along the direction `dir` from `anchor`.
fn label_position(anchor: Point, dir: Vec2, radius: f64) -> Point {
    let len = dir.hypot();
    if len < f64::EPSILON {
        return anchor + Vec2::new(radius, -radius);
    }
    anchor + dir / len * (radius + 14.0)
}

#[derive(Debug, Clone, Copy)]
pub struct AngleShape;

impl ToolShape for AngleShape {
    fn draw(&self, annotation: &Annotation) -> Vec<DrawOp> {
        let pts = annotation.positions();
        match pts.as_slice() {
            [anchor, first] => vec![DrawOp::stroke(annotation, geometry::line_path(*anchor, *first))],
            [anchor, first, second, ..] => {
                let (anchor, first, second) = (*anchor, *first, *second);
                let mut ops = vec![
                    DrawOp::stroke(annotation, geometry::line_path(anchor, first)),
                    DrawOp::stroke(annotation, geometry::line_path(anchor, second)),
                ];
                let marker = MARKER_RADIUS
                    .min(anchor.distance(first) * 0.5)
                    .min(anchor.distance(second) * 0.5);
                if marker > 1.0 {
                    let start = (first - anchor).atan2();
                    let sweep = geometry::signed_sweep(anchor, first, second);
                    ops.push(DrawOp::Stroke {
                        path: geometry::arc_path(anchor, marker, start, sweep),
                        width: (annotation.size * 0.5).max(1.0),
                        color: annotation.color,
                        opacity: annotation.opacity,
                        dashed: false,
                        round: true,
                    });
                }
                let bisector = unit(first - anchor) + unit(second - anchor);
                ops.push(DrawOp::label(
                    annotation,
                    label_position(anchor, bisector, marker.max(MARKER_RADIUS * 0.5)),
                    angle_label(anchor, first, second),
                ));
                ops
            }
            _ => Vec::new(),
        }
    }

    fn hit_test(&self, annotation: &Annotation, center: Point, radius: f64) -> bool {
        defining_radius_hit(annotation, center, radius)
    }

    fn commit_shape(&self, points: Vec<AnnotationPoint>) -> Option<Vec<AnnotationPoint>> {
        commit_three(points)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ArcShape;

impl ToolShape for ArcShape {
    fn draw(&self, annotation: &Annotation) -> Vec<DrawOp> {
        let pts = annotation.positions();
        match pts.as_slice() {
            [anchor, first] => vec![DrawOp::stroke(annotation, geometry::line_path(*anchor, *first))],
            [anchor, first, second, ..] => {
                let (anchor, first, second) = (*anchor, *first, *second);
                let radius = anchor.distance(first);
                if radius < f64::EPSILON {
                    return Vec::new();
                }
                let start = (first - anchor).atan2();
                let sweep = geometry::signed_sweep(anchor, first, second);
                let mid_angle = start + sweep * 0.5;
                let mid_dir = Vec2::new(mid_angle.cos(), mid_angle.sin());
                vec![
                    DrawOp::stroke(annotation, geometry::arc_path(anchor, radius, start, sweep)),
                    DrawOp::label(
                        annotation,
                        label_position(anchor, mid_dir, radius),
                        sweep_label(anchor, first, second),
                    ),
                ]
            }
            _ => Vec::new(),
        }
    }

    fn hit_test(&self, annotation: &Annotation, center: Point, radius: f64) -> bool {
        defining_radius_hit(annotation, center, radius)
    }

    fn commit_shape(&self, points: Vec<AnnotationPoint>) -> Option<Vec<AnnotationPoint>> {
        commit_three(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{InkColor, ToolKind};

    fn construction(tool: ToolKind) -> Annotation {
        Annotation::new(
            tool,
            InkColor::black(),
            2.0,
            1.0,
            vec![
                AnnotationPoint::new(0.0, 0.0),
                AnnotationPoint::new(50.0, 0.0),
                AnnotationPoint::new(0.0, 50.0),
            ],
        )
    }

    #[test]
    fn test_labels() {
        let (a, f, s) = (Point::ZERO, Point::new(50.0, 0.0), Point::new(0.0, 50.0));
        assert_eq!(angle_label(a, f, s), "90°");
        assert_eq!(sweep_label(a, f, s), "90°");
        assert_eq!(sweep_label(a, s, f), "-90°");
    }

    #[test]
    fn test_angle_draw_has_label() {
        let ops = AngleShape.draw(&construction(ToolKind::Angle));
        let label = ops.iter().find_map(|op| match op {
            DrawOp::Label(l) => Some(l.text.clone()),
            _ => None,
        });
        assert_eq!(label.as_deref(), Some("90°"));
    }

    #[test]
    fn test_radius_hit() {
        let arc = construction(ToolKind::Arc);
        assert!(ArcShape.hit_test(&arc, Point::new(0.0, 48.0), 5.0));
        assert!(!ArcShape.hit_test(&arc, Point::new(10.0, 10.0), 5.0));
    }

    #[test]
    fn test_commit_requires_three_points() {
        let pts = construction(ToolKind::Angle).points;
        assert_eq!(AngleShape.commit_shape(pts.clone()).map(|p| p.len()), Some(3));
        assert!(ArcShape.commit_shape(pts[..2].to_vec()).is_none());
    }
}
