//! Per-tool drawing and hit-testing.
//!
//! Every [`ToolKind`] that produces annotations has one [`ToolShape`]
//! implementation; [`shape_for`] is the dispatch table.

mod angle;
mod arrow;
mod circle;
mod freehand;
mod grid;
mod rectangle;
mod ruler;

pub use angle::{AngleShape, ArcShape, angle_label, sweep_label};
pub use arrow::ArrowShape;
pub use circle::{CompassShape, DiskShape};
pub use freehand::FreehandShape;
pub use grid::{GRID_SPACING, GridShape};
pub use rectangle::RectangleShape;
pub use ruler::RulerShape;

use crate::annotation::{Annotation, AnnotationPoint, InkColor, ToolKind};
use crate::geometry;
use kurbo::{BezPath, Point};

/// A text label placed on the annotation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub position: Point,
    pub text: String,
    pub color: InkColor,
    /// Font size in raster units.
    pub size: f64,
}

/// A primitive drawing command produced by a tool shape.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Stroke {
        path: BezPath,
        width: f64,
        color: InkColor,
        opacity: f64,
        dashed: bool,
        /// Round caps and joins (otherwise butt caps, miter joins).
        round: bool,
    },
    Fill {
        path: BezPath,
        color: InkColor,
        opacity: f64,
    },
    Label(Label),
}

impl DrawOp {
    /// Solid round-capped stroke in the annotation's own style.
    pub fn stroke(annotation: &Annotation, path: BezPath) -> Self {
        DrawOp::Stroke {
            path,
            width: annotation.size,
            color: annotation.color,
            opacity: annotation.opacity,
            dashed: false,
            round: true,
        }
    }

    /// Dashed guide stroke in the annotation's color.
    pub fn guide(annotation: &Annotation, path: BezPath) -> Self {
        DrawOp::Stroke {
            path,
            width: (annotation.size * 0.5).max(1.0),
            color: annotation.color,
            opacity: annotation.opacity,
            dashed: true,
            round: false,
        }
    }

    pub fn label(annotation: &Annotation, position: Point, text: impl Into<String>) -> Self {
        DrawOp::Label(Label {
            position,
            text: text.into(),
            color: annotation.color,
            size: (annotation.size * 4.0).clamp(12.0, 32.0),
        })
    }
}

/// Drawing, hit-testing and commit normalization for one tool kind.
pub trait ToolShape: Sync {
    /// Drawing commands for a committed annotation or an in-progress draft.
    ///
    /// Drafts may carry fewer points than a committed annotation; shapes draw
    /// whatever the points define so far.
    fn draw(&self, annotation: &Annotation) -> Vec<DrawOp>;

    /// Whether an eraser brush at `center` with `radius` touches the annotation.
    fn hit_test(&self, annotation: &Annotation, center: Point, radius: f64) -> bool {
        geometry::polyline_touches_circle(&annotation.positions(), center, radius)
    }

    /// Normalize draft points into the committed point list.
    ///
    /// Returns `None` when the draft cannot be committed.
    fn commit_shape(&self, points: Vec<AnnotationPoint>) -> Option<Vec<AnnotationPoint>> {
        endpoints(points)
    }
}

/// Keep only the first and last point of a draft with at least two points.
pub(crate) fn endpoints(points: Vec<AnnotationPoint>) -> Option<Vec<AnnotationPoint>> {
    match points.as_slice() {
        [first, .., last] => Some(vec![*first, *last]),
        _ => None,
    }
}

static PEN: FreehandShape = FreehandShape::pen();
static HIGHLIGHTER: FreehandShape = FreehandShape::highlighter();
static RULER: RulerShape = RulerShape;
static COMPASS: CompassShape = CompassShape;
static RECTANGLE: RectangleShape = RectangleShape;
static DISK: DiskShape = DiskShape;
static ARROW: ArrowShape = ArrowShape;
static ANGLE: AngleShape = AngleShape;
static ARC: ArcShape = ArcShape;
static GRID: GridShape = GridShape;

/// Look up the shape implementation of a tool. The eraser has none.
pub fn shape_for(tool: ToolKind) -> Option<&'static dyn ToolShape> {
    let shape: &'static dyn ToolShape = match tool {
        ToolKind::Pen => &PEN,
        ToolKind::Highlighter => &HIGHLIGHTER,
        ToolKind::Ruler => &RULER,
        ToolKind::Compass => &COMPASS,
        ToolKind::Rectangle => &RECTANGLE,
        ToolKind::Disk => &DISK,
        ToolKind::Arrow => &ARROW,
        ToolKind::Angle => &ANGLE,
        ToolKind::Arc => &ARC,
        ToolKind::Grid => &GRID,
        ToolKind::Eraser => return None,
    };
    Some(shape)
}

/// Drawing commands for any annotation.
pub fn draw(annotation: &Annotation) -> Vec<DrawOp> {
    shape_for(annotation.tool).map(|s| s.draw(annotation)).unwrap_or_default()
}
