//! # Ball simulation module
//!
//! Propagates a ballistic ball for the control loop to intercept. The ball
//! is regenerated on a fixed period at a deterministic pseudo-random spawn
//! state inside configured windows, so runs are repeatable without a seed
//! file.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during BallSim operation.
#[derive(Debug, thiserror::Error)]
pub enum BallSimError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Time step is negative ({0} s)")]
    NegativeTimeStep(f64),
}
