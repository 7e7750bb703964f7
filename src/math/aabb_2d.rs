use super::Point2;

/// Cohen-Sutherland region code bits.
pub const CODE_INSIDE: u8 = 0;
pub const CODE_LEFT: u8 = 1;
pub const CODE_RIGHT: u8 = 2;
pub const CODE_BOTTOM: u8 = 4;
pub const CODE_TOP: u8 = 8;

/// An axis-aligned bounding box in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb2 {
    /// Minimum corner of the bounding box.
    pub min: Point2,
    /// Maximum corner of the bounding box.
    pub max: Point2,
}

impl Aabb2 {
    /// Creates a box from two corners given in any order.
    #[must_use]
    pub fn from_corners(a: &Point2, b: &Point2) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Bounding box of the segment `a -> b`, with every axis whose extent is
    /// below `min_extent` widened symmetrically to exactly `min_extent`.
    #[must_use]
    pub fn from_segment(a: &Point2, b: &Point2, min_extent: f64) -> Self {
        let mut aabb = Self::from_corners(a, b);
        let half = min_extent * 0.5;

        if aabb.width() < min_extent {
            let cx = (aabb.min.x + aabb.max.x) * 0.5;
            aabb.min.x = cx - half;
            aabb.max.x = cx + half;
        }
        if aabb.height() < min_extent {
            let cy = (aabb.min.y + aabb.max.y) * 0.5;
            aabb.min.y = cy - half;
            aabb.max.y = cy + half;
        }
        aabb
    }

    /// Smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Extent along the x axis.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Extent along the y axis.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Returns whether `other` lies entirely inside `self` (boundary included).
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    /// Returns whether the two boxes share at least one point.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Cohen-Sutherland outcode of `p` relative to this box.
    #[must_use]
    pub fn outcode(&self, p: &Point2) -> u8 {
        let mut code = CODE_INSIDE;

        if p.x < self.min.x {
            code |= CODE_LEFT;
        } else if p.x > self.max.x {
            code |= CODE_RIGHT;
        }

        if p.y < self.min.y {
            code |= CODE_BOTTOM;
        } else if p.y > self.max.y {
            code |= CODE_TOP;
        }

        code
    }

    /// Conservative segment test: `false` only when both endpoints lie
    /// outside the box on the same side, so the segment provably misses it.
    #[must_use]
    pub fn may_intersect_segment(&self, a: &Point2, b: &Point2) -> bool {
        self.outcode(a) & self.outcode(b) == CODE_INSIDE
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn horizontal_segment_is_inflated_vertically() {
        let aabb = Aabb2::from_segment(&Point2::new(100.0, 100.0), &Point2::new(150.0, 100.0), 5.0);
        assert_relative_eq!(aabb.min.x, 100.0);
        assert_relative_eq!(aabb.max.x, 150.0);
        assert_relative_eq!(aabb.min.y, 97.5);
        assert_relative_eq!(aabb.max.y, 102.5);
    }

    #[test]
    fn short_axis_is_widened_to_exact_extent() {
        let aabb = Aabb2::from_segment(&Point2::new(0.0, 0.0), &Point2::new(2.0, 40.0), 5.0);
        assert_relative_eq!(aabb.width(), 5.0);
        assert_relative_eq!(aabb.min.x, -1.5);
        assert_relative_eq!(aabb.height(), 40.0);
    }

    #[test]
    fn union_contains_both() {
        let a = Aabb2::from_corners(&Point2::new(0.0, 0.0), &Point2::new(1.0, 1.0));
        let b = Aabb2::from_corners(&Point2::new(3.0, -2.0), &Point2::new(4.0, 0.5));
        let u = a.union(&b);
        assert!(u.contains(&a));
        assert!(u.contains(&b));
        assert_relative_eq!(u.min.y, -2.0);
        assert_relative_eq!(u.max.x, 4.0);
    }

    #[test]
    fn outcodes() {
        let aabb = Aabb2::from_corners(&Point2::new(0.0, 0.0), &Point2::new(10.0, 10.0));
        assert_eq!(aabb.outcode(&Point2::new(5.0, 5.0)), CODE_INSIDE);
        assert_eq!(aabb.outcode(&Point2::new(-1.0, 5.0)), CODE_LEFT);
        assert_eq!(aabb.outcode(&Point2::new(11.0, -1.0)), CODE_RIGHT | CODE_BOTTOM);
        assert_eq!(aabb.outcode(&Point2::new(5.0, 12.0)), CODE_TOP);
    }

    #[test]
    fn segment_pruning() {
        let aabb = Aabb2::from_corners(&Point2::new(0.0, 0.0), &Point2::new(10.0, 10.0));
        // Both endpoints to the left.
        assert!(!aabb.may_intersect_segment(&Point2::new(-5.0, 0.0), &Point2::new(-1.0, 20.0)));
        // Straddles the box.
        assert!(aabb.may_intersect_segment(&Point2::new(-5.0, 5.0), &Point2::new(15.0, 5.0)));
        // Both above.
        assert!(!aabb.may_intersect_segment(&Point2::new(-1.0, 12.0), &Point2::new(12.0, 30.0)));
        // Corner-skipping diagonal cannot be pruned by outcodes alone.
        assert!(aabb.may_intersect_segment(&Point2::new(-5.0, 8.0), &Point2::new(5.0, 20.0)));
    }
}
