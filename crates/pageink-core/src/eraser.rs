//! Eraser: brush hit-testing, removal and stroke fragmentation.
//!
//! Erasures mutate live state directly and are not recorded in history.

use crate::annotation::{Annotation, AnnotationPoint};
use crate::config::EngineConfig;
use crate::geometry::point_to_segment_dist;
use crate::shapes::shape_for;
use kurbo::Point;

/// Result of applying the brush to one annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum EraseOutcome {
    Untouched,
    Removed,
    /// A freehand stroke split into the pieces that survived.
    Fragmented(Vec<Annotation>),
}

/// Eraser brush parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eraser {
    brush_multiplier: f64,
    cursor_multiplier: f64,
}

impl Default for Eraser {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Eraser {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            brush_multiplier: config.eraser_brush_multiplier,
            cursor_multiplier: config.eraser_cursor_multiplier,
        }
    }

    /// Hit-test radius for a tool size.
    pub fn brush_radius(&self, size: f64) -> f64 {
        size * self.brush_multiplier
    }

    /// On-screen cursor radius for a tool size.
    pub fn cursor_radius(&self, size: f64) -> f64 {
        size * self.cursor_multiplier
    }

    /// Apply a brush of `radius` at `center` to a single annotation.
    pub fn apply(&self, annotation: &Annotation, center: Point, radius: f64) -> EraseOutcome {
        let Some(shape) = shape_for(annotation.tool) else {
            return EraseOutcome::Untouched;
        };
        if !shape.hit_test(annotation, center, radius) {
            return EraseOutcome::Untouched;
        }
        if !annotation.tool.is_freehand() {
            return EraseOutcome::Removed;
        }
        let pieces: Vec<Annotation> = fragment(&annotation.points, center, radius)
            .into_iter()
            .map(|points| annotation.with_points(points))
            .collect();
        if pieces.is_empty() {
            EraseOutcome::Removed
        } else {
            EraseOutcome::Fragmented(pieces)
        }
    }

    /// Erase across one page's annotations in place, keeping drawing order.
    ///
    /// Fragments take the place of the stroke they came from. Returns whether
    /// anything changed.
    pub fn erase_page(&self, annotations: &mut Vec<Annotation>, center: Point, size: f64) -> bool {
        let radius = self.brush_radius(size);
        let mut changed = false;
        let mut result = Vec::with_capacity(annotations.len());
        for annotation in annotations.drain(..) {
            match self.apply(&annotation, center, radius) {
                EraseOutcome::Untouched => result.push(annotation),
                EraseOutcome::Removed => changed = true,
                EraseOutcome::Fragmented(pieces) => {
                    changed = true;
                    result.extend(pieces);
                }
            }
        }
        *annotations = result;
        changed
    }
}

/// Split a polyline where the brush covers it.
///
/// Points inside the brush are dropped, and a run is also broken between two
/// surviving points whose connecting segment passes through the brush. Runs
/// with fewer than two points are discarded.
fn fragment(points: &[AnnotationPoint], center: Point, radius: f64) -> Vec<Vec<AnnotationPoint>> {
    let mut runs = Vec::new();
    let mut current: Vec<AnnotationPoint> = Vec::new();
    for point in points {
        if point.pos().distance(center) <= radius {
            runs.push(std::mem::take(&mut current));
            continue;
        }
        let cut = current
            .last()
            .is_some_and(|prev| point_to_segment_dist(center, prev.pos(), point.pos()) < radius);
        if cut {
            runs.push(std::mem::take(&mut current));
        }
        current.push(*point);
    }
    runs.push(current);
    runs.into_iter().filter(|run| run.len() >= 2).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{InkColor, ToolKind};

    fn line(tool: ToolKind, pts: &[(f64, f64)]) -> Annotation {
        let points = pts.iter().map(|&(x, y)| AnnotationPoint::new(x, y)).collect();
        Annotation::new(tool, InkColor::black(), 1.0, 1.0, points)
    }

    #[test]
    fn test_radii() {
        let eraser = Eraser::default();
        assert!((eraser.brush_radius(2.0) - 10.0).abs() < f64::EPSILON);
        assert!((eraser.cursor_radius(2.0) - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_disk_removed_only_when_touched() {
        let eraser = Eraser::default();
        let disk = line(ToolKind::Disk, &[(100.0, 100.0), (120.0, 100.0)]);
        assert_eq!(eraser.apply(&disk, Point::new(100.0, 100.0), 5.0), EraseOutcome::Removed);
        assert_eq!(eraser.apply(&disk, Point::new(200.0, 200.0), 5.0), EraseOutcome::Untouched);
    }

    #[test]
    fn test_pen_stroke_split() {
        let eraser = Eraser::default();
        let pts: Vec<_> = (0..=10).map(|i| (i as f64 * 10.0, 0.0)).collect();
        let stroke = line(ToolKind::Pen, &pts);
        let EraseOutcome::Fragmented(pieces) = eraser.apply(&stroke, Point::new(50.0, 0.0), 5.0) else {
            panic!("expected fragments");
        };
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].last_pos(), Some(Point::new(40.0, 0.0)));
        assert_eq!(pieces[1].first_pos(), Some(Point::new(60.0, 0.0)));
    }

    #[test]
    fn test_stroke_cut_between_points() {
        let stroke = line(ToolKind::Highlighter, &[(0.0, 0.0), (100.0, 0.0), (200.0, 0.0), (300.0, 0.0)]);
        let runs = fragment(&stroke.points, Point::new(150.0, 0.0), 5.0);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1].len(), 2);
    }

    #[test]
    fn test_short_stroke_removed_whole() {
        let eraser = Eraser::default();
        let stroke = line(ToolKind::Pen, &[(0.0, 0.0), (3.0, 0.0)]);
        assert_eq!(eraser.apply(&stroke, Point::new(1.0, 0.0), 5.0), EraseOutcome::Removed);
    }

    #[test]
    fn test_grid_immune() {
        let eraser = Eraser::default();
        let grid = Annotation::grid(InkColor::black(), 1.0, 100, 100);
        assert_eq!(eraser.apply(&grid, Point::new(50.0, 50.0), 100.0), EraseOutcome::Untouched);
    }

    #[test]
    fn test_erase_page_keeps_order() {
        let eraser = Eraser::default();
        let mut page = vec![
            line(ToolKind::Ruler, &[(0.0, 0.0), (10.0, 0.0)]),
            line(ToolKind::Pen, &[(0.0, 100.0), (50.0, 100.0), (100.0, 100.0), (150.0, 100.0)]),
            line(ToolKind::Arrow, &[(0.0, 300.0), (10.0, 300.0)]),
        ];
        // size 1 → brush radius 5
        assert!(eraser.erase_page(&mut page, Point::new(75.0, 100.0), 1.0));
        let tools: Vec<_> = page.iter().map(|a| a.tool).collect();
        assert_eq!(tools, vec![ToolKind::Ruler, ToolKind::Pen, ToolKind::Pen, ToolKind::Arrow]);
        assert!(!eraser.erase_page(&mut page, Point::new(500.0, 500.0), 1.0));
    }
}
