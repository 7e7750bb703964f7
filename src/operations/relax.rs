use std::collections::HashSet;

use crate::config::RelaxCoefficients;
use crate::field::{CurveSet, NodeRegistry, VertexId, VertexStore};
use crate::math::{Point2, Vector2, TOLERANCE};

/// One positional step of the declutter simulation.
///
/// Every curve vertex that is not a node is pushed by:
///
/// - loose vertices (on no curve, not an excluded node):
///   `obstacle * (v - p) / |v - p|^4`
/// - node vertices: `node * (v - n) / |v - n|^4`
/// - each curve neighbor `u`: `-spring * (v - u) * |rest_length - |v - u||`
///
/// and then advanced by `dt * power * F`. No velocity is kept between steps.
/// Forces are evaluated against the positions before the step, so the
/// result does not depend on visiting order. Coincident pairs are skipped.
#[derive(Debug, Clone)]
pub struct Relax {
    power: f64,
    dt: f64,
    coefficients: RelaxCoefficients,
    excluded_degrees: Vec<u8>,
}

impl Relax {
    /// Creates a step with default coefficients that ignores degree-0 nodes
    /// as loose obstacles.
    #[must_use]
    pub fn new(power: f64, dt: f64) -> Self {
        Self {
            power,
            dt,
            coefficients: RelaxCoefficients::default(),
            excluded_degrees: vec![0],
        }
    }

    /// Replaces the force law coefficients.
    #[must_use]
    pub fn with_coefficients(mut self, coefficients: RelaxCoefficients) -> Self {
        self.coefficients = coefficients;
        self
    }

    /// Node degrees whose vertices are not treated as loose obstacles.
    #[must_use]
    pub fn with_excluded_degrees(mut self, degrees: &[u8]) -> Self {
        self.excluded_degrees = degrees.to_vec();
        self
    }

    /// Computes the force on every movable curve vertex, in curve order.
    #[must_use]
    pub fn forces(
        &self,
        store: &VertexStore,
        nodes: &NodeRegistry,
        curves: &CurveSet,
    ) -> Vec<(VertexId, Vector2)> {
        let on_curve = curves.curve_vertices();
        let node_handles: HashSet<VertexId> = nodes.handles().into_iter().collect();
        let excluded: HashSet<VertexId> = nodes
            .handles_with_degree_in(&self.excluded_degrees)
            .into_iter()
            .collect();

        let obstacles: Vec<Point2> = store
            .all_handles()
            .filter(|id| !on_curve.contains(id) && !excluded.contains(id))
            .filter_map(|id| store.get(id))
            .collect();
        let node_points: Vec<Point2> = nodes
            .handles()
            .into_iter()
            .filter_map(|id| store.get(id))
            .collect();

        let c = &self.coefficients;
        let mut forces = Vec::new();

        for curve in curves.iter() {
            let ids = curve.vertices();
            for (i, &id) in ids.iter().enumerate() {
                if node_handles.contains(&id) {
                    continue;
                }
                let Some(v) = store.get(id) else {
                    continue;
                };

                let mut force = Vector2::zeros();
                for p in &obstacles {
                    force += repulsion(&v, p, c.obstacle);
                }
                for n in &node_points {
                    force += repulsion(&v, n, c.node);
                }

                let prev = i.checked_sub(1).and_then(|j| ids.get(j));
                let next = ids.get(i + 1);
                for u in prev.into_iter().chain(next).filter_map(|&u| store.get(u)) {
                    let d = v - u;
                    force += -c.spring * d * (c.rest_length - d.norm()).abs();
                }

                forces.push((id, force));
            }
        }
        forces
    }

    /// Applies one step and returns the vertices that actually moved.
    ///
    /// Curves holding a moved vertex lose their spatial index until
    /// [`CurveSet::rebuild_all_trees`] runs.
    pub fn execute(
        &self,
        store: &mut VertexStore,
        nodes: &NodeRegistry,
        curves: &mut CurveSet,
    ) -> Vec<VertexId> {
        let forces = self.forces(store, nodes, curves);
        let scale = self.dt * self.power;

        let mut moved = Vec::new();
        for (id, force) in forces {
            let step = force * scale;
            let displaced = step.norm_squared() > 0.0;
            if !displaced {
                continue;
            }
            if let Some(v) = store.get(id) {
                store.set(id, v + step);
                moved.push(id);
            }
        }
        curves.invalidate(&moved);
        moved
    }
}

/// `coefficient * (v - p) / |v - p|^4`, zero for coincident points.
fn repulsion(v: &Point2, p: &Point2, coefficient: f64) -> Vector2 {
    let d = v - p;
    let r2 = d.norm_squared();
    if r2 < TOLERANCE {
        return Vector2::zeros();
    }
    d * (coefficient / (r2 * r2))
}
