//! Geometry core of a Sprouts-style game: players join fixed nodes with
//! freehand curves that may not cross, and each node takes at most three
//! curve ends.
//!
//! The crate covers the parts with real geometry in them:
//!
//! - incremental curve sampling and the curve life cycle ([`field::CurveSet`])
//! - crossing detection through per-curve spatial indices ([`spatial`])
//! - the declutter relaxation step ([`operations::Relax`])
//!
//! Rendering and input polling stay with the caller, which drives a
//! [`Field`] once per frame.

pub mod config;
pub mod error;
pub mod field;
pub mod math;
pub mod operations;
pub mod spatial;

pub use config::{RelaxCoefficients, Tunables, MAX_DEGREE};
pub use error::{Result, SproutsError};
pub use field::{Field, Step};
