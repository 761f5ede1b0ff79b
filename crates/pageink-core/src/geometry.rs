//! Geometry primitives: distances, hit-tests and path construction.

use kurbo::{Arc, BezPath, Circle, Point, Rect, Shape as KurboShape, Vec2};

/// Flattening tolerance for curve-to-path conversion.
pub const PATH_TOLERANCE: f64 = 0.1;

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    point.distance(proj)
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => point.distance(*only),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Whether any vertex is within `radius` of `center`, or any segment passes closer than `radius`.
pub fn polyline_touches_circle(points: &[Point], center: Point, radius: f64) -> bool {
    if points.iter().any(|p| p.distance(center) <= radius) {
        return true;
    }
    points
        .windows(2)
        .any(|w| point_to_segment_dist(center, w[0], w[1]) < radius)
}

/// Brush touches the circumference of a circle (outline only).
pub fn circle_outline_hit(center: Point, radius: f64, brush: Point, brush_radius: f64) -> bool {
    (brush.distance(center) - radius).abs() < brush_radius
}

/// Brush overlaps a filled circle.
pub fn disk_hit(center: Point, radius: f64, brush: Point, brush_radius: f64) -> bool {
    brush.distance(center) <= radius + brush_radius
}

/// The four edges of a rectangle, clockwise from the top-left corner.
pub fn rect_edges(rect: Rect) -> [(Point, Point); 4] {
    let tl = Point::new(rect.x0, rect.y0);
    let tr = Point::new(rect.x1, rect.y0);
    let br = Point::new(rect.x1, rect.y1);
    let bl = Point::new(rect.x0, rect.y1);
    [(tl, tr), (tr, br), (br, bl), (bl, tl)]
}

/// Brush is near any edge of a rectangle outline.
pub fn rect_outline_hit(rect: Rect, brush: Point, brush_radius: f64) -> bool {
    rect_edges(rect)
        .iter()
        .any(|&(a, b)| point_to_segment_dist(brush, a, b) < brush_radius)
}

/// Unsigned angle between rays `vertex→a` and `vertex→b`, in degrees (0..=180).
pub fn angle_degrees(vertex: Point, a: Point, b: Point) -> f64 {
    let va = a - vertex;
    let vb = b - vertex;
    if va.hypot2() < f64::EPSILON || vb.hypot2() < f64::EPSILON {
        return 0.0;
    }
    let cos = (va.dot(vb) / (va.hypot() * vb.hypot())).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Signed sweep (radians, in (-π, π]) rotating `center→from` onto `center→to`.
pub fn signed_sweep(center: Point, from: Point, to: Point) -> f64 {
    let a = (from - center).atan2();
    let b = (to - center).atan2();
    let mut sweep = b - a;
    while sweep <= -std::f64::consts::PI {
        sweep += std::f64::consts::TAU;
    }
    while sweep > std::f64::consts::PI {
        sweep -= std::f64::consts::TAU;
    }
    sweep
}

/// Smooth a polyline with quadratic curves through segment midpoints.
pub fn smooth_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some(&first) = points.first() else {
        return path;
    };
    path.move_to(first);
    match points.len() {
        1 => path.line_to(first),
        2 => path.line_to(points[1]),
        n => {
            for i in 1..n - 1 {
                let mid = points[i].midpoint(points[i + 1]);
                path.quad_to(points[i], mid);
            }
            path.line_to(points[n - 1]);
        }
    }
    path
}

/// Straight segment path.
pub fn line_path(a: Point, b: Point) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(a);
    path.line_to(b);
    path
}

/// Full circle path.
pub fn circle_path(center: Point, radius: f64) -> BezPath {
    Circle::new(center, radius).to_path(PATH_TOLERANCE)
}

/// Circular arc from the direction of `start` sweeping `sweep` radians.
pub fn arc_path(center: Point, radius: f64, start_angle: f64, sweep: f64) -> BezPath {
    let arc = Arc {
        center,
        radii: Vec2::new(radius, radius),
        start_angle,
        sweep_angle: sweep,
        x_rotation: 0.0,
    };
    arc.to_path(PATH_TOLERANCE)
}

/// Arrowhead barbs at `tip` for a shaft coming from `tail`.
///
/// Returns `None` when the shaft is too short to have a direction.
pub fn arrow_head(tail: Point, tip: Point, head_size: f64) -> Option<(Point, Point)> {
    const HEAD_ANGLE: f64 = 0.523_598_775_598_298_9; // 30 degrees
    let shaft = tip - tail;
    let len = shaft.hypot();
    if len < 1.0 {
        return None;
    }
    let back = -shaft / len;
    let rotate = |v: Vec2, angle: f64| {
        let (s, c) = angle.sin_cos();
        Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
    };
    let left = tip + rotate(back, HEAD_ANGLE) * head_size;
    let right = tip + rotate(back, -HEAD_ANGLE) * head_size;
    Some((left, right))
}

/// Tick marks along a ruler segment, every `spacing` units.
///
/// Every fifth tick is twice as long.
pub fn ruler_ticks(a: Point, b: Point, spacing: f64, tick_len: f64) -> Vec<(Point, Point)> {
    let seg = b - a;
    let len = seg.hypot();
    if len < f64::EPSILON || spacing <= 0.0 {
        return Vec::new();
    }
    let dir = seg / len;
    let normal = Vec2::new(-dir.y, dir.x);
    let count = (len / spacing).floor() as usize;
    (0..=count)
        .map(|i| {
            let base = a + dir * (i as f64 * spacing);
            let l = if i % 5 == 0 { tick_len * 2.0 } else { tick_len };
            (base, base + normal * l)
        })
        .collect()
}
