use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy for the dynamics engine.
///
/// Per-object failures ([`DegenerateOrbit`](TycheError::DegenerateOrbit),
/// [`NumericalDivergence`](TycheError::NumericalDivergence),
/// [`UnphysicalResult`](TycheError::UnphysicalResult)) are recoverable: the
/// search orchestrator skips the offending object and records a warning.
/// System-level failures ([`ZeroTotalMass`](TycheError::ZeroTotalMass),
/// [`EmptySystem`](TycheError::EmptySystem),
/// [`InsufficientData`](TycheError::InsufficientData)) abort the run and are
/// surfaced to the caller.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TycheError {
    #[error("Degenerate orbit: {0}")]
    DegenerateOrbit(String),

    #[error("Kepler solver failed to converge after {iterations} iterations (last correction {last_delta:e})")]
    NumericalDivergence { iterations: usize, last_delta: f64 },

    #[error("Unphysical orbital elements: {0}")]
    UnphysicalResult(String),

    #[error("Not enough data for clustering statistic: {got} surviving effects (need at least {min})")]
    InsufficientData { got: usize, min: usize },

    #[error("Total system mass is zero or negative; barycenter undefined")]
    ZeroTotalMass,

    #[error("System contains no bodies")]
    EmptySystem,

    #[error("Unknown search preset: {0}")]
    UnknownPreset(String),
}
