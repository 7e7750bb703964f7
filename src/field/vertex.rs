use slotmap::SlotMap;

use crate::error::StoreError;
use crate::math::Point2;

slotmap::new_key_type! {
    /// Generation-tagged handle of a vertex in the [`VertexStore`].
    ///
    /// A handle stays valid until its own vertex is deleted; deleting other
    /// vertices never shifts it. A deleted handle never aliases a later one.
    pub struct VertexId;
}

/// Arena of every point on the field: node positions and curve vertices.
#[derive(Debug, Default, Clone)]
pub struct VertexStore {
    vertices: SlotMap<VertexId, Point2>,
}

impl VertexStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a point and returns its handle.
    pub fn push(&mut self, x: f64, y: f64) -> VertexId {
        self.vertices.insert(Point2::new(x, y))
    }

    /// Returns the point behind `id`, `None` if it was deleted.
    #[must_use]
    pub fn get(&self, id: VertexId) -> Option<Point2> {
        self.vertices.get(id).copied()
    }

    /// Returns the point behind `id`, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::VertexNotFound` if the handle was deleted.
    pub fn try_get(&self, id: VertexId) -> Result<Point2, StoreError> {
        self.get(id)
            .ok_or_else(|| StoreError::VertexNotFound(format!("{id:?}")))
    }

    /// Returns the points behind `ids` in the given order.
    ///
    /// Stale handles are skipped.
    #[must_use]
    pub fn get_many(&self, ids: &[VertexId]) -> Vec<Point2> {
        ids.iter().filter_map(|&id| self.get(id)).collect()
    }

    /// Moves the vertex `id` to `point`. Returns `false` for a stale handle.
    pub fn set(&mut self, id: VertexId, point: Point2) -> bool {
        match self.vertices.get_mut(id) {
            Some(slot) => {
                *slot = point;
                true
            }
            None => false,
        }
    }

    /// Removes the given vertices and returns how many were actually removed.
    pub fn delete(&mut self, ids: &[VertexId]) -> usize {
        ids.iter()
            .filter(|&&id| self.vertices.remove(id).is_some())
            .count()
    }

    /// Live handles in storage order.
    pub fn all_handles(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys()
    }

    /// Returns whether `id` refers to a live vertex.
    #[must_use]
    pub fn contains(&self, id: VertexId) -> bool {
        self.vertices.contains_key(id)
    }

    /// Number of live vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns whether the store holds no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}
