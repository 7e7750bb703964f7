//! Per-curve spatial indices used to prune segment-crossing queries.

pub mod bvh;
pub mod grid;

pub use bvh::BoundingTree;
pub use grid::BruteForceGrid;

use crate::math::aabb_2d::Aabb2;
use crate::math::Point2;

/// Broad-phase index over the segments of one polyline.
///
/// Queries are conservative: a hit means the segment `a -> b` may touch one
/// of the indexed segments' (inflated) boxes. A miss is always exact.
pub trait SpatialIndex {
    /// Returns the index of some segment whose box the query segment cannot
    /// be separated from, or `None` when every box is provably missed.
    fn hit_segment(&self, a: &Point2, b: &Point2) -> Option<usize> {
        self.hit_segment_excluding(a, b, &[])
    }

    /// Like [`SpatialIndex::hit_segment`], ignoring the segments listed in
    /// `excluded`. Used for segments that share an endpoint with the query.
    fn hit_segment_excluding(&self, a: &Point2, b: &Point2, excluded: &[usize]) -> Option<usize>;

    /// Returns whether the query segment may touch any indexed segment.
    fn may_cross(&self, a: &Point2, b: &Point2) -> bool {
        self.hit_segment(a, b).is_some()
    }

    /// Bounding box of all indexed segments, `None` when empty.
    fn bounds(&self) -> Option<Aabb2>;

    /// Number of indexed segments.
    fn segment_count(&self) -> usize;
}

/// Which index implementation a [`crate::field::CurveSet`] builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpatialIndexKind {
    /// Bottom-up bounding-volume tree with Cohen-Sutherland pruning.
    #[default]
    BoundingTree,
    /// Uniform bucket grid of leaf boxes.
    BruteForceGrid,
}

impl SpatialIndexKind {
    /// Builds an index of this kind over the polyline `points`.
    #[must_use]
    pub fn build(self, points: &[Point2], min_extent: f64) -> CurveIndex {
        let boxes = segment_boxes(points, min_extent);
        match self {
            Self::BoundingTree => CurveIndex::Tree(BoundingTree::from_leaf_boxes(boxes)),
            Self::BruteForceGrid => CurveIndex::Grid(BruteForceGrid::from_leaf_boxes(boxes)),
        }
    }
}

/// An index owned by a curve.
#[derive(Debug, Clone)]
pub enum CurveIndex {
    Tree(BoundingTree),
    Grid(BruteForceGrid),
}

impl CurveIndex {
    /// Returns the tree when this index is a [`BoundingTree`].
    #[must_use]
    pub fn as_tree(&self) -> Option<&BoundingTree> {
        match self {
            Self::Tree(tree) => Some(tree),
            Self::Grid(_) => None,
        }
    }
}

impl SpatialIndex for CurveIndex {
    fn hit_segment_excluding(&self, a: &Point2, b: &Point2, excluded: &[usize]) -> Option<usize> {
        match self {
            Self::Tree(tree) => tree.hit_segment_excluding(a, b, excluded),
            Self::Grid(grid) => grid.hit_segment_excluding(a, b, excluded),
        }
    }

    fn bounds(&self) -> Option<Aabb2> {
        match self {
            Self::Tree(tree) => tree.bounds(),
            Self::Grid(grid) => grid.bounds(),
        }
    }

    fn segment_count(&self) -> usize {
        match self {
            Self::Tree(tree) => tree.segment_count(),
            Self::Grid(grid) => grid.segment_count(),
        }
    }
}

/// One inflated box per consecutive-vertex pair, in polyline order.
#[must_use]
pub fn segment_boxes(points: &[Point2], min_extent: f64) -> Vec<Aabb2> {
    points
        .windows(2)
        .map(|pair| Aabb2::from_segment(&pair[0], &pair[1], min_extent))
        .collect()
}
