//! Parameters structure for the serial kinematic chain

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters describing one revolute joint of the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointParams {
    /// Translation from the previous joint frame to this joint's origin.
    ///
    /// Units: meters
    pub offset_m: [f64; 3],

    /// Rotation axis in the parent frame, normalised on load.
    pub axis: [f64; 3],
}

/// Parameters for a serial kinematic chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainParams {
    /// The joints of the chain, base first.
    pub joints: Vec<JointParams>,

    /// Translation from the last joint frame to the paddle centre.
    ///
    /// Units: meters
    pub tool_offset_m: [f64; 3],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ChainParams {
    /// Reference 7 joint arm with alternating roll/pitch axes and a total
    /// reach of 1.25 m.
    fn default() -> Self {
        Self {
            joints: vec![
                JointParams { offset_m: [0.0, 0.0, 0.15], axis: [0.0, 0.0, 1.0] },
                JointParams { offset_m: [0.0, 0.0, 0.10], axis: [0.0, 1.0, 0.0] },
                JointParams { offset_m: [0.0, 0.0, 0.25], axis: [0.0, 0.0, 1.0] },
                JointParams { offset_m: [0.0, 0.0, 0.25], axis: [0.0, 1.0, 0.0] },
                JointParams { offset_m: [0.0, 0.0, 0.20], axis: [0.0, 0.0, 1.0] },
                JointParams { offset_m: [0.0, 0.0, 0.10], axis: [0.0, 1.0, 0.0] },
                JointParams { offset_m: [0.0, 0.0, 0.05], axis: [0.0, 0.0, 1.0] },
            ],
            tool_offset_m: [0.0, 0.0, 0.15],
        }
    }
}
