use thiserror::Error;

/// Top-level error type for the Sprouts geometry core.
#[derive(Debug, Error)]
pub enum SproutsError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Curve(#[from] CurveError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Errors related to the vertex store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vertex not found: {0}")]
    VertexNotFound(String),
}

/// Errors related to the curve state machine.
#[derive(Debug, Error)]
pub enum CurveError {
    #[error("no curve is being drawn")]
    NoActiveCurve,

    #[error("a curve is already being drawn")]
    AlreadyDrawing,

    #[error("curve {0} does not exist")]
    NotFound(usize),
}

/// Errors related to random node placement.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("canvas {width}x{height} leaves no room for a margin of {margin}")]
    CanvasTooSmall { width: f64, height: f64, margin: f64 },

    #[error("placed {placed} of {requested} nodes before giving up after {attempts} attempts")]
    Infeasible {
        placed: usize,
        requested: usize,
        attempts: usize,
    },
}

/// Convenience type alias for results using [`SproutsError`].
pub type Result<T> = std::result::Result<T, SproutsError>;
