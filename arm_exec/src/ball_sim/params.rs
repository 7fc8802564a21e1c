//! Parameters structure for BallSim

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the ball simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Gravitational acceleration magnitude.
    ///
    /// Units: meters/second^2
    pub gravity_mss: f64,

    /// Period between ball regenerations.
    ///
    /// Units: seconds
    pub regen_period_s: f64,

    /// Lower corner of the spawn position window.
    ///
    /// Units: meters
    pub spawn_pos_min_m: [f64; 3],

    /// Upper corner of the spawn position window.
    ///
    /// Units: meters
    pub spawn_pos_max_m: [f64; 3],

    /// Lower corner of the spawn velocity window.
    ///
    /// Units: meters/second
    pub spawn_vel_min_ms: [f64; 3],

    /// Upper corner of the spawn velocity window.
    ///
    /// Units: meters/second
    pub spawn_vel_max_ms: [f64; 3],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            gravity_mss: 9.82,
            regen_period_s: 3.0,
            spawn_pos_min_m: [-0.2, 0.8, 1.8],
            spawn_pos_max_m: [0.2, 1.2, 2.2],
            spawn_vel_min_ms: [-0.2, -1.2, -1.2],
            spawn_vel_max_ms: [0.2, -0.8, -0.8],
        }
    }
}
