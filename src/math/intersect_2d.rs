use super::Point2;

/// Twice the signed area of the triangle `(a, b, c)`.
///
/// Positive when `c` lies to the left of the directed line `a -> b`,
/// negative to the right, zero when the three points are collinear.
#[must_use]
pub fn orientation(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Sign of `value` as `-1`, `0` or `1`. Exact zero maps to `0`.
fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Returns whether the closed intervals `[a0, a1]` and `[b0, b1]` overlap,
/// regardless of endpoint order.
fn intervals_overlap(a0: f64, a1: f64, b0: f64, b1: f64) -> bool {
    a0.min(a1) <= b0.max(b1) && b0.min(b1) <= a0.max(a1)
}

/// Bounded segment-segment intersection predicate in 2D.
///
/// Segments `a0 -> a1` and `b0 -> b1` intersect when their projections on
/// both axes overlap and each segment's endpoints lie on opposite sides of
/// (or on) the line through the other. Touching and collinear overlap count
/// as intersections. The predicate is symmetric in the two segments.
#[must_use]
pub fn segments_intersect(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2) -> bool {
    if !intervals_overlap(a0.x, a1.x, b0.x, b1.x) || !intervals_overlap(a0.y, a1.y, b0.y, b1.y) {
        return false;
    }

    let side_b0 = sign(orientation(a0, a1, b0));
    let side_b1 = sign(orientation(a0, a1, b1));
    let side_a0 = sign(orientation(b0, b1, a0));
    let side_a1 = sign(orientation(b0, b1, a1));

    side_b0 * side_b1 <= 0 && side_a0 * side_a1 <= 0
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: &Point2, b: &Point2) -> f64 {
    nalgebra::distance(a, b)
}
