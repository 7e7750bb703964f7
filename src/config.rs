use crate::spatial::SpatialIndexKind;

/// Highest number of curve ends a node can accept.
pub const MAX_DEGREE: u8 = 3;

/// Force law coefficients for the relaxation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxCoefficients {
    /// Inverse-fourth-power repulsion from loose vertices.
    pub obstacle: f64,
    /// Inverse-fourth-power repulsion from node vertices.
    pub node: f64,
    /// Spring gain toward neighboring curve vertices.
    pub spring: f64,
    /// Target spacing between neighboring curve vertices.
    pub rest_length: f64,
}

impl Default for RelaxCoefficients {
    fn default() -> Self {
        Self {
            obstacle: 50.0,
            node: 2000.0,
            spring: 0.002,
            rest_length: 5.0,
        }
    }
}

/// Tunable constants of a game field.
#[derive(Debug, Clone, PartialEq)]
pub struct Tunables {
    /// Radius within which a point picks a node.
    pub pick_radius: f64,
    /// Minimum spacing between consecutive sampled curve vertices.
    pub sample_spacing: f64,
    /// Minimum distance between randomly placed nodes, also the canvas margin.
    pub min_separation: f64,
    /// Number of nodes placed at game start.
    pub node_count: usize,
    /// Canvas width used by random placement.
    pub canvas_width: f64,
    /// Canvas height used by random placement.
    pub canvas_height: f64,
    /// Minimum extent of a leaf box along each axis.
    pub leaf_min_extent: f64,
    /// Trailing segments of the drawn curve skipped by the exact self-check.
    pub self_check_skip: usize,
    /// Rejection-sampling attempts allowed per node before giving up.
    pub max_placement_attempts: usize,
    /// Index built for every finished curve.
    pub index_kind: SpatialIndexKind,
    /// Force law of the declutter step.
    pub relax: RelaxCoefficients,
    /// Node degrees the declutter step does not treat as loose obstacles.
    pub relax_excluded_degrees: Vec<u8>,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pick_radius: 8.0,
            sample_spacing: 5.0,
            min_separation: 100.0,
            node_count: 16,
            canvas_width: 1024.0,
            canvas_height: 768.0,
            leaf_min_extent: 5.0,
            self_check_skip: 1,
            max_placement_attempts: 10_000,
            index_kind: SpatialIndexKind::BoundingTree,
            relax: RelaxCoefficients::default(),
            relax_excluded_degrees: vec![0],
        }
    }
}

impl Tunables {
    /// Sets the canvas size.
    #[must_use]
    pub fn with_canvas(mut self, width: f64, height: f64) -> Self {
        self.canvas_width = width;
        self.canvas_height = height;
        self
    }

    /// Sets the node count and their minimum separation.
    #[must_use]
    pub fn with_nodes(mut self, count: usize, min_separation: f64) -> Self {
        self.node_count = count;
        self.min_separation = min_separation;
        self
    }

    /// Sets the node pick radius.
    #[must_use]
    pub fn with_pick_radius(mut self, radius: f64) -> Self {
        self.pick_radius = radius;
        self
    }

    /// Sets the minimum spacing between sampled curve vertices.
    #[must_use]
    pub fn with_sample_spacing(mut self, spacing: f64) -> Self {
        self.sample_spacing = spacing;
        self
    }

    /// Selects the spatial index kind.
    #[must_use]
    pub fn with_index_kind(mut self, kind: SpatialIndexKind) -> Self {
        self.index_kind = kind;
        self
    }

    /// Replaces the declutter force law.
    #[must_use]
    pub fn with_relax(mut self, relax: RelaxCoefficients) -> Self {
        self.relax = relax;
        self
    }

    /// Sets the node degrees the declutter step ignores as loose obstacles.
    #[must_use]
    pub fn with_relax_excluded_degrees(mut self, degrees: &[u8]) -> Self {
        self.relax_excluded_degrees = degrees.to_vec();
        self
    }
}
