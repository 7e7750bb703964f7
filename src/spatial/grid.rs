use crate::math::aabb_2d::Aabb2;
use crate::math::Point2;

use super::SpatialIndex;

/// Flat-array bucket grid over the leaf boxes of one polyline.
///
/// Each leaf box is registered in every cell it overlaps. A query visits the
/// cells covered by the query segment's box and applies the same outcode
/// test as the tree to every candidate, so both indices answer identically.
#[derive(Debug, Clone)]
pub struct BruteForceGrid {
    boxes: Vec<Aabb2>,
    bounds: Option<Aabb2>,
    origin: Point2,
    inv_cell_size: f64,
    cols: usize,
    rows: usize,
    /// Indexed by `row * cols + col`, each cell lists segment indices.
    cells: Vec<Vec<usize>>,
}

impl BruteForceGrid {
    /// Builds a grid from leaf boxes given in polyline order.
    ///
    /// The grid has roughly `sqrt(n)` cells along its longer side.
    #[must_use]
    pub fn from_leaf_boxes(boxes: Vec<Aabb2>) -> Self {
        let bounds = boxes.iter().copied().reduce(|acc, b| acc.union(&b));
        let Some(extent) = bounds else {
            return Self {
                boxes,
                bounds: None,
                origin: Point2::origin(),
                inv_cell_size: 1.0,
                cols: 1,
                rows: 1,
                cells: vec![Vec::new()],
            };
        };

        #[allow(clippy::cast_precision_loss)]
        let per_side = (boxes.len() as f64).sqrt().ceil().max(1.0);
        let cell_size = (extent.width().max(extent.height()) / per_side).max(f64::EPSILON);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cols = (extent.width() / cell_size).ceil().max(1.0) as usize;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rows = (extent.height() / cell_size).ceil().max(1.0) as usize;

        let mut grid = Self {
            boxes,
            bounds,
            origin: extent.min,
            inv_cell_size: cell_size.recip(),
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
        };

        for segment in 0..grid.boxes.len() {
            let (c0, r0, c1, r1) = grid.cell_range(&grid.boxes[segment]);
            for row in r0..=r1 {
                for col in c0..=c1 {
                    grid.cells[row * grid.cols + col].push(segment);
                }
            }
        }

        grid
    }

    /// Map a coordinate pair to (col, row), clamped to the grid.
    fn cell_of(&self, x: f64, y: f64) -> (usize, usize) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let col = ((x - self.origin.x) * self.inv_cell_size).floor().max(0.0) as usize;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let row = ((y - self.origin.y) * self.inv_cell_size).floor().max(0.0) as usize;
        (col.min(self.cols - 1), row.min(self.rows - 1))
    }

    /// Inclusive cell range `(col0, row0, col1, row1)` covered by `aabb`.
    fn cell_range(&self, aabb: &Aabb2) -> (usize, usize, usize, usize) {
        let (c0, r0) = self.cell_of(aabb.min.x, aabb.min.y);
        let (c1, r1) = self.cell_of(aabb.max.x, aabb.max.y);
        (c0, r0, c1, r1)
    }

    /// Number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

impl SpatialIndex for BruteForceGrid {
    fn hit_segment_excluding(&self, a: &Point2, b: &Point2, excluded: &[usize]) -> Option<usize> {
        let bounds = self.bounds?;
        let query = Aabb2::from_corners(a, b);
        if !query.overlaps(&bounds) {
            return None;
        }

        let (c0, r0, c1, r1) = self.cell_range(&query);
        for row in r0..=r1 {
            for col in c0..=c1 {
                for &segment in &self.cells[row * self.cols + col] {
                    if excluded.contains(&segment) {
                        continue;
                    }
                    if self.boxes[segment].may_intersect_segment(a, b) {
                        return Some(segment);
                    }
                }
            }
        }
        None
    }

    fn bounds(&self) -> Option<Aabb2> {
        self.bounds
    }

    fn segment_count(&self) -> usize {
        self.boxes.len()
    }
}
