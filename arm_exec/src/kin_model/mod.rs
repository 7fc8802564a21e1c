//! # Kinematic model module
//!
//! Maps a joint configuration to the end-effector pose and the linear and
//! angular Jacobians. The model is consumed by the IK solver many times per
//! cycle, so implementations must be pure: repeated evaluation at the same
//! configuration returns the same result with no side effects.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod serial_chain;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

// Internal
pub use params::*;
pub use serial_chain::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Pose and Jacobians of a link evaluated at a joint configuration.
#[derive(Debug, Clone)]
pub struct TaskState {
    /// Link position in the base frame.
    ///
    /// Units: meters
    pub pos_m: Vector3<f64>,

    /// Link orientation in the base frame (orthonormal, right-handed).
    pub rot: Matrix3<f64>,

    /// Linear Jacobian (3 rows by number of evaluated joints).
    pub jac_lin: DMatrix<f64>,

    /// Angular Jacobian (3 rows by number of evaluated joints).
    pub jac_ang: DMatrix<f64>,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A kinematic model of the arm.
pub trait KinematicModel {
    /// The total number of joints in the model.
    fn num_joints(&self) -> usize;

    /// Evaluate the pose and Jacobians at the given configuration.
    ///
    /// `q_rad` may be a truncated prefix of the full joint vector, in which
    /// case the returned state is that of the last link reached. This is
    /// used for intermediate-link queries such as the elbow or wrist.
    fn fkin(&self, q_rad: &DVector<f64>) -> TaskState;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur while building a kinematic model.
#[derive(Debug, thiserror::Error)]
pub enum KinModelError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Chain has no joints")]
    EmptyChain,

    #[error("Joint {0} has a zero-length rotation axis")]
    ZeroAxis(usize),
}
