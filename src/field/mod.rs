//! The game field: vertices, nodes and curves, plus the move rules that tie
//! them together.

pub mod curve;
pub mod node;
pub mod vertex;

pub use curve::{Curve, CurveSet, CurveState};
pub use node::{Node, NodeId, NodeRegistry, Placement};
pub use vertex::{VertexId, VertexStore};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::Tunables;
use crate::error::{CurveError, Result};
use crate::math::Point2;
use crate::operations::Relax;

/// Outcome of feeding one pointer position to the drawn curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A vertex was appended.
    Extended,
    /// Too close to the last vertex, nothing changed.
    Skipped,
    /// The move would cross a curve, nothing changed.
    Crossed,
}

/// One game session: owns the vertex store, the nodes and the curves.
///
/// Components are plain owned values, so independent sessions never share
/// state. Read access is open for renderers; mutation goes through the
/// move-rule methods or the component methods directly.
#[derive(Debug, Clone)]
pub struct Field {
    vertices: VertexStore,
    nodes: NodeRegistry,
    curves: CurveSet,
    tunables: Tunables,
    /// Node the drawn curve started from.
    origin: Option<NodeId>,
}

impl Default for Field {
    fn default() -> Self {
        Self::new(Tunables::default())
    }
}

impl Field {
    /// Creates an empty field.
    #[must_use]
    pub fn new(tunables: Tunables) -> Self {
        Self {
            vertices: VertexStore::new(),
            nodes: NodeRegistry::new(tunables.pick_radius),
            curves: CurveSet::from(&tunables),
            tunables,
            origin: None,
        }
    }

    /// Constants this field was created with.
    #[must_use]
    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    /// The vertex store.
    #[must_use]
    pub fn vertices(&self) -> &VertexStore {
        &self.vertices
    }

    /// The node registry.
    #[must_use]
    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    /// The curve set.
    #[must_use]
    pub fn curves(&self) -> &CurveSet {
        &self.curves
    }

    /// Mutable access to all three components at once.
    pub fn parts_mut(&mut self) -> (&mut VertexStore, &mut NodeRegistry, &mut CurveSet) {
        (&mut self.vertices, &mut self.nodes, &mut self.curves)
    }

    /// Places the configured number of nodes at random.
    ///
    /// # Errors
    ///
    /// Returns a `GenerationError` if the layout cannot be satisfied.
    pub fn generate<R: Rng>(&mut self, rng: &mut R) -> Result<Vec<NodeId>> {
        let placement = Placement::from(&self.tunables);
        Ok(self
            .nodes
            .generate_random(&mut self.vertices, &placement, rng)?)
    }

    /// Like [`Field::generate`] with a reproducible seed.
    ///
    /// # Errors
    ///
    /// Returns a `GenerationError` if the layout cannot be satisfied.
    pub fn generate_seeded(&mut self, seed: u64) -> Result<Vec<NodeId>> {
        self.generate(&mut SmallRng::seed_from_u64(seed))
    }

    /// Places a node at a fixed position.
    pub fn add_node(&mut self, point: Point2, degree: u8) -> NodeId {
        self.nodes.add_node(&mut self.vertices, point, degree)
    }

    /// The node under `point`, if any.
    #[must_use]
    pub fn hover(&self, point: &Point2) -> Option<NodeId> {
        self.nodes.hit_test(&self.vertices, point)
    }

    /// Returns whether a curve is being drawn.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        self.curves.active().is_some()
    }

    /// Starts a curve from `node` when it is free, taking one of its slots.
    ///
    /// Returns `false` and changes nothing when the node is full or unknown.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::AlreadyDrawing` if a curve is already being drawn.
    pub fn begin_curve(&mut self, node: NodeId) -> Result<bool> {
        let Some(anchor) = self.nodes.vertex_of(node) else {
            return Ok(false);
        };
        if !self.nodes.is_free(node) {
            return Ok(false);
        }
        self.curves.start(anchor)?;
        self.nodes.rise_degree(node, 1);
        self.origin = Some(node);
        Ok(true)
    }

    /// Moves the drawn curve toward `point`.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::NoActiveCurve` if no curve is being drawn.
    pub fn extend_curve(&mut self, point: &Point2) -> Result<Step> {
        if !self.is_drawing() {
            return Err(CurveError::NoActiveCurve.into());
        }
        if self.curves.check_crossing(&self.vertices, point) {
            return Ok(Step::Crossed);
        }
        let spacing = self.tunables.sample_spacing;
        if self.curves.sample(&mut self.vertices, point, spacing)? {
            Ok(Step::Extended)
        } else {
            Ok(Step::Skipped)
        }
    }

    /// Connects the drawn curve to `node`.
    ///
    /// On success the node takes a slot, the curve is indexed and its middle
    /// vertex becomes a new node of degree 2, whose id is returned. When the
    /// node is full or unknown, the closing segment crosses a curve, or the
    /// curve has no room for a middle vertex, the curve is aborted and `None`
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::NoActiveCurve` if no curve is being drawn.
    pub fn finish_curve(&mut self, node: NodeId) -> Result<Option<NodeId>> {
        let (anchor_len, last) = {
            let active = self.curves.active().ok_or(CurveError::NoActiveCurve)?;
            (active.vertices().len(), active.vertices().last().copied())
        };
        let terminal = self.nodes.vertex_of(node).filter(|_| self.nodes.is_free(node));
        let (Some(terminal), Some(last)) = (terminal, last) else {
            self.abort_curve()?;
            return Ok(None);
        };
        if self.curves.check_closing(&self.vertices, terminal) {
            debug!(node = %node, "closing segment crosses a curve");
            self.abort_curve()?;
            return Ok(None);
        }

        // A direct stroke gets one vertex halfway so there is a middle to promote.
        if anchor_len == 1 {
            let (Some(a), Some(b)) = (self.vertices.get(last), self.vertices.get(terminal)) else {
                self.abort_curve()?;
                return Ok(None);
            };
            let half = Point2::from((a.coords + b.coords) * 0.5);
            if !self.curves.sample(&mut self.vertices, &half, 0.0)? {
                self.abort_curve()?;
                return Ok(None);
            }
        }

        let index = self.curves.end(&self.vertices, terminal)?;
        self.nodes.rise_degree(node, 1);
        self.origin = None;

        let middle = self
            .curves
            .get(index)
            .and_then(Curve::middle)
            .ok_or(CurveError::NotFound(index))?;
        let promoted = self.nodes.add_node_from_handle(middle, 2);
        debug!(curve = index, node = %promoted, "middle vertex promoted");
        Ok(Some(promoted))
    }

    /// Discards the drawn curve and gives the start node its slot back.
    ///
    /// # Errors
    ///
    /// Returns `CurveError::NoActiveCurve` if no curve is being drawn.
    pub fn abort_curve(&mut self) -> Result<()> {
        self.curves.cancel(&mut self.vertices)?;
        if let Some(origin) = self.origin.take() {
            self.nodes.lower_degree(origin, 1);
        }
        Ok(())
    }

    /// One declutter step with the configured coefficients and excluded
    /// node degrees.
    ///
    /// Returns the number of vertices moved. Call [`Field::settle`] once the
    /// declutter action ends.
    pub fn declutter(&mut self, power: f64, dt: f64) -> usize {
        let step = Relax::new(power, dt)
            .with_coefficients(self.tunables.relax)
            .with_excluded_degrees(&self.tunables.relax_excluded_degrees);
        self.curves.relax(&mut self.vertices, &self.nodes, &step)
    }

    /// Rebuilds every curve index after decluttering.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::VertexNotFound` if a curve refers to a deleted vertex.
    pub fn settle(&mut self) -> Result<()> {
        self.curves.rebuild_all_trees(&self.vertices)
    }

    /// Every curve as a list of points, for drawing.
    #[must_use]
    pub fn polylines(&self) -> Vec<Vec<Point2>> {
        self.curves
            .iter()
            .map(|curve| curve.points(&self.vertices))
            .collect()
    }
}
