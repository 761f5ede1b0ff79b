//! Input point validation.

use crate::document::Page;
use kurbo::Point;

/// Why a point was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    OutOfBounds,
    /// Too far from the previous accepted point; usually a device glitch.
    Jump,
}

/// Validate a point before it is appended to a draft.
///
/// `previous` is the last accepted point of the same stroke, if any.
pub fn check_point(page: &Page, previous: Option<Point>, point: Point, max_jump: f64) -> Result<(), Rejection> {
    if !point.x.is_finite() || !point.y.is_finite() || !page.contains(point) {
        return Err(Rejection::OutOfBounds);
    }
    match previous {
        Some(prev) if prev.distance(point) > max_jump => Err(Rejection::Jump),
        _ => Ok(()),
    }
}
