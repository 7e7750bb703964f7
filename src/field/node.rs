use std::fmt;

use rand::Rng;
use tracing::{debug, warn};

use crate::config::{Tunables, MAX_DEGREE};
use crate::error::GenerationError;
use crate::math::intersect_2d::distance;
use crate::math::Point2;

use super::vertex::{VertexId, VertexStore};

/// Index of a node in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A fixed point on the field that curves connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    /// Vertex holding the node position.
    pub vertex: VertexId,
    /// Number of curve ends attached, always in `0..=MAX_DEGREE`.
    pub degree: u8,
}

impl Node {
    /// Returns whether another curve end may attach.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.degree < MAX_DEGREE
    }
}

/// Parameters of random node placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Canvas width.
    pub width: f64,
    /// Canvas height.
    pub height: f64,
    /// Number of nodes to place.
    pub count: usize,
    /// Minimum pairwise distance, also used as the canvas margin.
    pub min_separation: f64,
    /// Attempts allowed per node.
    pub max_attempts: usize,
}

impl From<&Tunables> for Placement {
    fn from(t: &Tunables) -> Self {
        Self {
            width: t.canvas_width,
            height: t.canvas_height,
            count: t.node_count,
            min_separation: t.min_separation,
            max_attempts: t.max_placement_attempts,
        }
    }
}

/// All nodes of a game, in creation order.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    nodes: Vec<Node>,
    pick_radius: f64,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new(Tunables::default().pick_radius)
    }
}

impl NodeRegistry {
    /// Creates an empty registry picking nodes within `pick_radius`.
    #[must_use]
    pub fn new(pick_radius: f64) -> Self {
        Self {
            nodes: Vec::new(),
            pick_radius,
        }
    }

    /// Places `placement.count` nodes by rejection sampling.
    ///
    /// Each candidate is drawn uniformly from the canvas shrunk by
    /// `min_separation` on every side and rejected while it is closer than
    /// `min_separation` to a node placed by this call.
    ///
    /// # Errors
    ///
    /// - `GenerationError::CanvasTooSmall` if the sampling window is empty
    /// - `GenerationError::Infeasible` if a node cannot be placed within
    ///   `max_attempts` draws
    pub fn generate_random<R: Rng>(
        &mut self,
        store: &mut VertexStore,
        placement: &Placement,
        rng: &mut R,
    ) -> Result<Vec<NodeId>, GenerationError> {
        let margin = placement.min_separation;
        let (x_lo, x_hi) = (margin, placement.width - margin);
        let (y_lo, y_hi) = (margin, placement.height - margin);
        if !(x_lo <= x_hi && y_lo <= y_hi) {
            return Err(GenerationError::CanvasTooSmall {
                width: placement.width,
                height: placement.height,
                margin,
            });
        }

        let mut placed: Vec<Point2> = Vec::with_capacity(placement.count);
        let mut attempts = 0;

        while placed.len() < placement.count {
            let mut accepted = None;
            for _ in 0..placement.max_attempts {
                attempts += 1;
                let candidate = Point2::new(
                    rng.random_range(x_lo..=x_hi),
                    rng.random_range(y_lo..=y_hi),
                );
                if placed.iter().all(|p| distance(p, &candidate) >= margin) {
                    accepted = Some(candidate);
                    break;
                }
            }

            let Some(point) = accepted else {
                warn!(
                    placed = placed.len(),
                    requested = placement.count,
                    attempts,
                    "node placement is infeasible"
                );
                return Err(GenerationError::Infeasible {
                    placed: placed.len(),
                    requested: placement.count,
                    attempts,
                });
            };
            placed.push(point);
        }

        let ids = placed
            .iter()
            .map(|p| self.add_node(store, *p, 0))
            .collect::<Vec<_>>();
        debug!(count = ids.len(), attempts, "generated field");
        Ok(ids)
    }

    /// Creates a vertex at `point` and registers it as a node.
    ///
    /// `degree` is clamped into `0..=MAX_DEGREE`.
    pub fn add_node(&mut self, store: &mut VertexStore, point: Point2, degree: u8) -> NodeId {
        let vertex = store.push(point.x, point.y);
        self.add_node_from_handle(vertex, degree)
    }

    /// Registers an existing vertex as a node.
    pub fn add_node_from_handle(&mut self, vertex: VertexId, degree: u8) -> NodeId {
        self.nodes.push(Node {
            vertex,
            degree: degree.min(MAX_DEGREE),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Raises the degree by `amount`, unless that would exceed `MAX_DEGREE`.
    pub fn rise_degree(&mut self, id: NodeId, amount: u8) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            if let Some(raised) = node.degree.checked_add(amount).filter(|d| *d <= MAX_DEGREE) {
                node.degree = raised;
            }
        }
    }

    /// Lowers the degree by `amount`, unless that would go below zero.
    pub fn lower_degree(&mut self, id: NodeId, amount: u8) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            if let Some(lowered) = node.degree.checked_sub(amount) {
                node.degree = lowered;
            }
        }
    }

    /// Returns whether the node accepts another curve end. Unknown nodes are not free.
    #[must_use]
    pub fn is_free(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(Node::is_free)
    }

    /// Degree of the node, `0` for an unknown id.
    #[must_use]
    pub fn degree(&self, id: NodeId) -> u8 {
        self.nodes.get(id.0).map_or(0, |node| node.degree)
    }

    /// Vertex handle of the node.
    #[must_use]
    pub fn vertex_of(&self, id: NodeId) -> Option<VertexId> {
        self.nodes.get(id.0).map(|node| node.vertex)
    }

    /// Returns the first node, in creation order, within the pick radius of `point`.
    ///
    /// This is not a nearest-node search: earlier nodes win ties and overlaps.
    #[must_use]
    pub fn hit_test(&self, store: &VertexStore, point: &Point2) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| {
                store
                    .get(node.vertex)
                    .is_some_and(|p| distance(&p, point) < self.pick_radius)
            })
            .map(NodeId)
    }

    /// Vertex handles of nodes whose degree is one of `degrees`.
    #[must_use]
    pub fn handles_with_degree_in(&self, degrees: &[u8]) -> Vec<VertexId> {
        self.nodes
            .iter()
            .filter(|node| degrees.contains(&node.degree))
            .map(|node| node.vertex)
            .collect()
    }

    /// Vertex handles of every node.
    #[must_use]
    pub fn handles(&self) -> Vec<VertexId> {
        self.nodes.iter().map(|node| node.vertex).collect()
    }

    /// Nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Position and degree of every node with a live vertex, for drawing.
    pub fn positions<'a>(
        &'a self,
        store: &'a VertexStore,
    ) -> impl Iterator<Item = (NodeId, Point2, u8)> + 'a {
        self.iter()
            .filter_map(|(id, node)| store.get(node.vertex).map(|p| (id, p, node.degree)))
    }

    /// Radius used by [`NodeRegistry::hit_test`].
    #[must_use]
    pub fn pick_radius(&self) -> f64 {
        self.pick_radius
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
