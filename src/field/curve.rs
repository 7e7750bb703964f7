use std::collections::HashSet;

use tracing::{debug, trace};

use crate::config::Tunables;
use crate::error::{CurveError, Result};
use crate::math::intersect_2d::{distance, segments_intersect};
use crate::math::Point2;
use crate::operations::relax::Relax;
use crate::spatial::{BoundingTree, CurveIndex, SpatialIndex, SpatialIndexKind};

use super::node::NodeRegistry;
use super::vertex::{VertexId, VertexStore};

/// Lifecycle of a curve. A cancelled curve is removed from its set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveState {
    /// Being drawn: the last vertex follows the pointer.
    Drawing,
    /// Connected at both ends and indexed.
    Finished,
}

/// A player-drawn polyline between two nodes.
#[derive(Debug, Clone)]
pub struct Curve {
    vertices: Vec<VertexId>,
    state: CurveState,
    index: Option<CurveIndex>,
}

impl Curve {
    fn new(anchor: VertexId) -> Self {
        Self {
            vertices: vec![anchor],
            state: CurveState::Drawing,
            index: None,
        }
    }

    /// Vertex handles in drawing order.
    #[must_use]
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// Vertex positions in drawing order, stale handles skipped.
    #[must_use]
    pub fn points(&self, store: &VertexStore) -> Vec<Point2> {
        store.get_many(&self.vertices)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> CurveState {
        self.state
    }

    /// Returns whether the curve is connected at both ends.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == CurveState::Finished
    }

    /// Number of segments, one less than the vertex count.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    /// The vertex at `len / 2`, promoted to a node when the curve is finished.
    #[must_use]
    pub fn middle(&self) -> Option<VertexId> {
        self.vertices.get(self.vertices.len() / 2).copied()
    }

    /// The spatial index, `None` while drawing or after the geometry moved.
    #[must_use]
    pub fn index(&self) -> Option<&CurveIndex> {
        self.index.as_ref()
    }

    /// The bounding-volume tree, when the index is one.
    #[must_use]
    pub fn tree(&self) -> Option<&BoundingTree> {
        self.index.as_ref().and_then(CurveIndex::as_tree)
    }
}

/// Every curve of a game, the last one possibly still being drawn.
#[derive(Debug, Clone)]
pub struct CurveSet {
    curves: Vec<Curve>,
    index_kind: SpatialIndexKind,
    leaf_min_extent: f64,
    self_check_skip: usize,
}

impl Default for CurveSet {
    fn default() -> Self {
        Self::from(&Tunables::default())
    }
}

impl From<&Tunables> for CurveSet {
    fn from(t: &Tunables) -> Self {
        Self::new(t.index_kind, t.leaf_min_extent, t.self_check_skip)
    }
}

impl CurveSet {
    /// Creates an empty set.
    ///
    /// `self_check_skip` trailing segments of the drawn curve are left out
    /// of the exact self-crossing test, because they share an endpoint with
    /// the segment being tested.
    #[must_use]
    pub fn new(index_kind: SpatialIndexKind, leaf_min_extent: f64, self_check_skip: usize) -> Self {
        Self {
            curves: Vec::new(),
            index_kind,
            leaf_min_extent,
            self_check_skip,
        }
    }

    /// Starts drawing a new curve at `anchor` and returns its index.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::AlreadyDrawing` if another curve is being drawn.
    pub fn start(&mut self, anchor: VertexId) -> Result<usize> {
        if self.active().is_some() {
            return Err(CurveError::AlreadyDrawing.into());
        }
        self.curves.push(Curve::new(anchor));
        debug!(curve = self.curves.len() - 1, "curve started");
        Ok(self.curves.len() - 1)
    }

    /// The curve being drawn, if any.
    #[must_use]
    pub fn active(&self) -> Option<&Curve> {
        self.curves
            .last()
            .filter(|curve| curve.state == CurveState::Drawing)
    }

    fn active_mut(&mut self) -> Result<&mut Curve> {
        self.curves
            .last_mut()
            .filter(|curve| curve.state == CurveState::Drawing)
            .ok_or_else(|| CurveError::NoActiveCurve.into())
    }

    /// Appends a vertex at `point` to the drawn curve when it lies farther
    /// than `min_spacing` from the curve's last vertex.
    ///
    /// Returns whether a vertex was appended.
    ///
    /// # Errors
    ///
    /// - `CurveError::NoActiveCurve` if no curve is being drawn
    /// - `StoreError::VertexNotFound` if the last vertex was deleted
    pub fn sample(&mut self, store: &mut VertexStore, point: &Point2, min_spacing: f64) -> Result<bool> {
        let curve = self.active_mut()?;
        let last = curve
            .vertices
            .last()
            .copied()
            .ok_or(CurveError::NoActiveCurve)?;
        let last = store.try_get(last)?;

        if distance(&last, point) <= min_spacing {
            return Ok(false);
        }
        curve.vertices.push(store.push(point.x, point.y));
        Ok(true)
    }

    /// Closes the drawn curve at `terminal`, marks it finished and indexes it.
    ///
    /// The curve is left untouched when its index cannot be built.
    /// Returns the index of the finished curve.
    ///
    /// # Errors
    ///
    /// - `CurveError::NoActiveCurve` if no curve is being drawn
    /// - `StoreError::VertexNotFound` if one of its vertices was deleted
    pub fn end(&mut self, store: &VertexStore, terminal: VertexId) -> Result<usize> {
        let (kind, min_extent) = (self.index_kind, self.leaf_min_extent);
        let index = self.curves.len().saturating_sub(1);
        let curve = self.active_mut()?;

        let mut points = resolve(store, &curve.vertices)?;
        points.push(store.try_get(terminal)?);
        let built = kind.build(&points, min_extent);

        curve.vertices.push(terminal);
        curve.state = CurveState::Finished;
        curve.index = Some(built);
        debug!(curve = index, vertices = points.len(), "curve finished");
        Ok(index)
    }

    /// Discards the drawn curve and deletes its vertices, except the anchor
    /// which belongs to a node.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::NoActiveCurve` if no curve is being drawn.
    pub fn cancel(&mut self, store: &mut VertexStore) -> Result<()> {
        self.active_mut()?;
        let Some(curve) = self.curves.pop() else {
            return Err(CurveError::NoActiveCurve.into());
        };
        let removed = store.delete(&curve.vertices[1..]);
        debug!(removed, "curve cancelled");
        Ok(())
    }

    /// Returns whether extending the drawn curve from its last vertex to
    /// `point` would cross any curve, the drawn one included.
    ///
    /// The drawn curve is tested exactly; finished curves are tested through
    /// their spatial index, which may report near misses as crossings but
    /// never misses a real one. A finished curve whose index was dropped by
    /// [`CurveSet::relax`] is tested exactly. Segments that end at the last
    /// vertex are ignored. Returns `false` when nothing is being drawn.
    #[must_use]
    pub fn check_crossing(&self, store: &VertexStore, point: &Point2) -> bool {
        self.crosses(store, point, None)
    }

    /// Returns whether closing the drawn curve with a straight segment to
    /// `terminal` would cross any curve.
    ///
    /// Segments attached to `terminal` are ignored as well, so closing into
    /// a node that already has curves is allowed. Returns `false` when
    /// nothing is being drawn or `terminal` is stale.
    #[must_use]
    pub fn check_closing(&self, store: &VertexStore, terminal: VertexId) -> bool {
        store
            .get(terminal)
            .is_some_and(|point| self.crosses(store, &point, Some(terminal)))
    }

    fn crosses(&self, store: &VertexStore, point: &Point2, terminal: Option<VertexId>) -> bool {
        let Some(active) = self.active() else {
            return false;
        };
        let Some(&from_id) = active.vertices.last() else {
            return false;
        };
        let Some(from) = store.get(from_id) else {
            return false;
        };
        let touches = |pair: &[VertexId]| pair.iter().any(|&id| id == from_id || Some(id) == terminal);

        let checked = active
            .segment_count()
            .saturating_sub(self.self_check_skip);
        if let Some(segment) = active
            .vertices
            .windows(2)
            .take(checked)
            .position(|pair| !touches(pair) && exact_hit(store, pair, &from, point))
        {
            trace!(segment, "crossing with the drawn curve");
            return true;
        }

        for (curve, other) in self.curves.iter().enumerate() {
            if !other.is_finished() {
                continue;
            }
            let shared: Vec<usize> = other
                .vertices
                .windows(2)
                .enumerate()
                .filter(|(_, pair)| touches(*pair))
                .map(|(segment, _)| segment)
                .collect();

            let hit = if let Some(index) = &other.index {
                index.hit_segment_excluding(&from, point, &shared)
            } else {
                trace!(curve, "no index, testing segments exactly");
                other
                    .vertices
                    .windows(2)
                    .enumerate()
                    .find(|(segment, pair)| {
                        !shared.contains(segment) && exact_hit(store, pair, &from, point)
                    })
                    .map(|(segment, _)| segment)
            };
            if let Some(segment) = hit {
                trace!(curve, segment, "crossing with a finished curve");
                return true;
            }
        }
        false
    }

    /// Rebuilds the spatial index of the curve at `index`.
    ///
    /// # Errors
    ///
    /// - `CurveError::NotFound` if there is no such curve
    /// - `StoreError::VertexNotFound` if one of its vertices was deleted
    pub fn build_tree(&mut self, store: &VertexStore, index: usize) -> Result<()> {
        let (kind, min_extent) = (self.index_kind, self.leaf_min_extent);
        let curve = self
            .curves
            .get_mut(index)
            .ok_or(CurveError::NotFound(index))?;

        let points = resolve(store, &curve.vertices)?;
        let built = kind.build(&points, min_extent);
        debug!(
            curve = index,
            segments = built.segment_count(),
            depth = built.as_tree().map(BoundingTree::depth),
            "index rebuilt"
        );
        curve.index = Some(built);
        Ok(())
    }

    /// Rebuilds the spatial index of the most recent curve.
    ///
    /// # Errors
    ///
    /// Same as [`CurveSet::build_tree`]; `CurveError::NotFound` when the set is empty.
    pub fn build_last_tree(&mut self, store: &VertexStore) -> Result<()> {
        let last = self
            .curves
            .len()
            .checked_sub(1)
            .ok_or(CurveError::NotFound(0))?;
        self.build_tree(store, last)
    }

    /// Rebuilds the index of every finished curve.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::VertexNotFound` if a curve refers to a deleted vertex.
    pub fn rebuild_all_trees(&mut self, store: &VertexStore) -> Result<()> {
        for index in 0..self.curves.len() {
            if self.curves[index].is_finished() {
                self.build_tree(store, index)?;
            }
        }
        Ok(())
    }

    /// Runs one relaxation step and drops the index of every curve that
    /// moved. Call [`CurveSet::rebuild_all_trees`] before relying on the
    /// indices again.
    ///
    /// Returns the number of vertices moved.
    pub fn relax(&mut self, store: &mut VertexStore, nodes: &NodeRegistry, step: &Relax) -> usize {
        step.execute(store, nodes, self).len()
    }

    /// Drops the index of every curve holding one of `moved`.
    pub(crate) fn invalidate(&mut self, moved: &[VertexId]) {
        let moved: HashSet<VertexId> = moved.iter().copied().collect();
        for (index, curve) in self.curves.iter_mut().enumerate() {
            if curve.index.is_some() && curve.vertices.iter().any(|id| moved.contains(id)) {
                trace!(curve = index, "index dropped");
                curve.index = None;
            }
        }
    }

    /// Handles of every vertex that belongs to some curve.
    #[must_use]
    pub fn curve_vertices(&self) -> HashSet<VertexId> {
        self.curves
            .iter()
            .flat_map(|curve| curve.vertices.iter().copied())
            .collect()
    }

    /// Returns the curve at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Curve> {
        self.curves.get(index)
    }

    /// Curves in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Curve> + '_ {
        self.curves.iter()
    }

    /// Number of curves, the drawn one included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    /// Returns whether the set holds no curve at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}

/// Positions of `ids`, failing on the first deleted handle.
fn resolve(store: &VertexStore, ids: &[VertexId]) -> Result<Vec<Point2>> {
    Ok(ids
        .iter()
        .map(|&id| store.try_get(id))
        .collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Exact test of the segment `pair` against `a -> b`. Stale handles never hit.
fn exact_hit(store: &VertexStore, pair: &[VertexId], a: &Point2, b: &Point2) -> bool {
    match (store.get(pair[0]), store.get(pair[1])) {
        (Some(p0), Some(p1)) => segments_intersect(&p0, &p1, a, b),
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::error::SproutsError;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    /// Finishes a straight curve between two fresh vertices.
    fn finished_segment(store: &mut VertexStore, curves: &mut CurveSet, a: Point2, b: Point2) -> usize {
        let start = store.push(a.x, a.y);
        let end = store.push(b.x, b.y);
        curves.start(start).unwrap();
        curves.end(store, end).unwrap()
    }

    #[test]
    fn sample_decimates() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        let anchor = store.push(0.0, 0.0);
        curves.start(anchor).unwrap();

        let stream = [
            p(1.0, 0.0),
            p(3.0, 0.0),
            p(5.0, 0.0),
            p(5.5, 0.0),
            p(8.0, 1.0),
            p(11.0, 0.0),
            p(12.0, 0.0),
            p(20.0, 0.0),
        ];
        for point in &stream {
            curves.sample(&mut store, point, 5.0).unwrap();
        }

        let points = curves.active().unwrap().points(&store);
        assert_eq!(points.len(), 4);
        for pair in points.windows(2) {
            assert!(distance(&pair[0], &pair[1]) > 5.0);
        }
    }

    #[test]
    fn sample_without_active_curve_fails() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        let err = curves.sample(&mut store, &p(0.0, 0.0), 5.0).unwrap_err();
        assert!(matches!(err, SproutsError::Curve(CurveError::NoActiveCurve)));
        assert!(curves.cancel(&mut store).is_err());
        let v = store.push(0.0, 0.0);
        assert!(curves.end(&store, v).is_err());
    }

    #[test]
    fn start_twice_fails() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        let anchor = store.push(0.0, 0.0);
        curves.start(anchor).unwrap();
        let err = curves.start(anchor).unwrap_err();
        assert!(matches!(err, SproutsError::Curve(CurveError::AlreadyDrawing)));
    }

    #[test]
    fn cancel_keeps_only_the_anchor() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        let anchor = store.push(0.0, 0.0);
        let before = store.len();

        curves.start(anchor).unwrap();
        for i in 1..10 {
            curves
                .sample(&mut store, &p(f64::from(i) * 10.0, 0.0), 5.0)
                .unwrap();
        }
        assert_eq!(store.len(), before + 9);

        curves.cancel(&mut store).unwrap();
        assert_eq!(store.len(), before);
        assert!(store.get(anchor).is_some());
        assert!(curves.is_empty());
        assert!(curves.active().is_none());
    }

    #[test]
    fn end_builds_tree() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        let index = finished_segment(&mut store, &mut curves, p(0.0, 0.0), p(100.0, 0.0));
        let curve = curves.get(index).unwrap();
        assert!(curve.is_finished());
        assert_eq!(curve.vertices().len(), 2);

        let tree = curve.tree().unwrap();
        assert_eq!(tree.leaf_count(), 1);
        let root = tree.bounds().unwrap();
        assert_relative_eq!(root.min.x, 0.0);
        assert_relative_eq!(root.max.x, 100.0);
        assert_relative_eq!(root.min.y, -2.5);
        assert_relative_eq!(root.max.y, 2.5);
    }

    #[test]
    fn build_tree_unknown_curve_fails() {
        let store = VertexStore::new();
        let mut curves = CurveSet::default();
        assert!(matches!(
            curves.build_tree(&store, 3).unwrap_err(),
            SproutsError::Curve(CurveError::NotFound(3))
        ));
        assert!(curves.build_last_tree(&store).is_err());
    }

    #[test]
    fn self_crossing_is_detected() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        let anchor = store.push(0.0, 0.0);
        curves.start(anchor).unwrap();
        for point in [p(20.0, 0.0), p(20.0, 20.0), p(10.0, 20.0)] {
            curves.sample(&mut store, &point, 5.0).unwrap();
        }
        // Back down through the first segment.
        assert!(curves.check_crossing(&store, &p(10.0, -10.0)));
        // Stays clear of it.
        assert!(!curves.check_crossing(&store, &p(10.0, 10.0)));
    }

    #[test]
    fn preceding_segment_does_not_count() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        let anchor = store.push(0.0, 0.0);
        curves.start(anchor).unwrap();
        curves.sample(&mut store, &p(10.0, 0.0), 5.0).unwrap();

        // Collinear continuation and a sharp turn both touch the previous
        // segment only at the shared endpoint.
        assert!(!curves.check_crossing(&store, &p(20.0, 0.0)));
        assert!(!curves.check_crossing(&store, &p(10.0, 10.0)));
        // Folding straight back along the previous segment is also ignored.
        assert!(!curves.check_crossing(&store, &p(4.0, 0.0)));
    }

    #[test]
    fn crossing_against_finished_curves() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        finished_segment(&mut store, &mut curves, p(0.0, 0.0), p(100.0, 0.0));
        finished_segment(&mut store, &mut curves, p(50.0, -50.0), p(50.0, 50.0));

        let anchor = store.push(50.0, -60.0);
        curves.start(anchor).unwrap();
        assert!(curves.check_crossing(&store, &p(50.0, 60.0)));
        assert!(!curves.check_crossing(&store, &p(150.0, -60.0)));
    }

    #[test]
    fn segments_at_the_shared_vertex_are_ignored() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        let node = store.push(0.0, 0.0);
        let far = store.push(100.0, 0.0);
        curves.start(node).unwrap();
        curves.end(&store, far).unwrap();

        // Leaving the node the existing curve is attached to.
        curves.start(node).unwrap();
        assert!(!curves.check_crossing(&store, &p(0.0, 40.0)));
        curves.sample(&mut store, &p(0.0, 40.0), 5.0).unwrap();
        // Coming back across the curve away from the node still counts.
        assert!(curves.check_crossing(&store, &p(50.0, -40.0)));
        // Closing into the far end of the existing curve is fine.
        assert!(!curves.check_closing(&store, far));
    }

    #[test]
    fn closing_segment_is_checked() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        finished_segment(&mut store, &mut curves, p(50.0, -50.0), p(50.0, 50.0));

        let left = store.push(0.0, 0.0);
        let right = store.push(100.0, 0.0);
        let clear = store.push(0.0, 100.0);
        curves.start(left).unwrap();
        assert!(curves.check_closing(&store, right));
        assert!(!curves.check_closing(&store, clear));
    }

    #[test]
    fn failed_end_leaves_the_curve_drawing() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        let anchor = store.push(0.0, 0.0);
        let terminal = store.push(100.0, 0.0);
        curves.start(anchor).unwrap();
        curves.sample(&mut store, &p(50.0, 0.0), 5.0).unwrap();
        let sampled = curves.active().unwrap().vertices()[1];
        store.delete(&[sampled]);

        let err = curves.end(&store, terminal).unwrap_err();
        assert!(matches!(err, SproutsError::Store(_)));
        let active = curves.active().unwrap();
        assert_eq!(active.state(), CurveState::Drawing);
        assert_eq!(active.vertices().len(), 2);
        assert!(active.index().is_none());
        curves.cancel(&mut store).unwrap();
        assert!(curves.is_empty());
    }

    #[test]
    fn unindexed_curve_is_tested_exactly() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        let anchor = store.push(0.0, 0.0);
        curves.start(anchor).unwrap();
        for x in [10.0, 20.0, 30.0] {
            curves.sample(&mut store, &p(x, 0.0), 5.0).unwrap();
        }
        let terminal = store.push(40.0, 0.0);
        curves.end(&store, terminal).unwrap();
        curves.relax(&mut store, &NodeRegistry::default(), &Relax::new(1.0, 1.0));
        assert!(curves.get(0).unwrap().index().is_none());

        let anchor = store.push(15.0, -30.0);
        curves.start(anchor).unwrap();
        assert!(curves.check_crossing(&store, &p(15.0, 30.0)));
        assert!(!curves.check_crossing(&store, &p(100.0, -30.0)));
    }

    #[test]
    fn grid_index_gives_same_answers() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::new(SpatialIndexKind::BruteForceGrid, 5.0, 1);
        finished_segment(&mut store, &mut curves, p(0.0, 0.0), p(100.0, 0.0));
        assert!(curves.get(0).unwrap().tree().is_none());
        assert!(curves.get(0).unwrap().index().is_some());

        let anchor = store.push(50.0, -60.0);
        curves.start(anchor).unwrap();
        assert!(curves.check_crossing(&store, &p(50.0, 60.0)));
        assert!(!curves.check_crossing(&store, &p(50.0, -10.0)));
    }

    #[test]
    fn check_crossing_without_active_curve() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        finished_segment(&mut store, &mut curves, p(0.0, 0.0), p(100.0, 0.0));
        assert!(!curves.check_crossing(&store, &p(50.0, 50.0)));
    }

    #[test]
    fn middle_vertex() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        let anchor = store.push(0.0, 0.0);
        curves.start(anchor).unwrap();
        for x in [10.0, 20.0, 30.0] {
            curves.sample(&mut store, &p(x, 0.0), 5.0).unwrap();
        }
        let terminal = store.push(40.0, 0.0);
        let index = curves.end(&store, terminal).unwrap();
        let curve = curves.get(index).unwrap();
        let middle = store.get(curve.middle().unwrap()).unwrap();
        assert_relative_eq!(middle.x, 20.0);
    }

    #[test]
    fn rebuild_restores_dropped_indices() {
        let mut store = VertexStore::new();
        let mut curves = CurveSet::default();
        let anchor = store.push(0.0, 0.0);
        curves.start(anchor).unwrap();
        for x in [10.0, 20.0, 30.0] {
            curves.sample(&mut store, &p(x, 0.0), 5.0).unwrap();
        }
        let terminal = store.push(40.0, 0.0);
        curves.end(&store, terminal).unwrap();

        let nodes = NodeRegistry::default();
        let moved = curves.relax(&mut store, &nodes, &Relax::new(1.0, 1.0));
        assert!(moved > 0);
        assert!(curves.get(0).unwrap().index().is_none());

        curves.rebuild_all_trees(&store).unwrap();
        assert!(curves.get(0).unwrap().tree().is_some());
    }
}
