//! # Paddle control module
//!
//! Paddle control is responsible for intercepting a ballistically moving
//! ball with the arm's paddle and redirecting it toward a target point.
//!
//! When the ball observer reports a regeneration the module forward-predicts
//! the ball's flight to find where it first enters the paddle's reachable
//! region, computes the pose and twist the paddle must have at that point,
//! and solves the corresponding joint-space boundary condition with a
//! weighted damped-Newton IK solver. The motion from the current joint state
//! to the boundary condition is blended with a quintic joint-space
//! trajectory which is re-sampled every cycle.
//!
//! If prediction or IK fails, or the active trajectory runs out, the module
//! opens a trajectory back to the rest configuration instead. Planning
//! failures are recoverable and are surfaced through the diagnostic string
//! in the output, never as a processing error.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod ik_solver;
mod impact_pred;
mod params;
#[cfg(feature = "repulsion")]
mod repulsion;
mod state;
mod traj_blend;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use ik_solver::*;
pub use impact_pred::*;
pub use params::*;
#[cfg(feature = "repulsion")]
pub use repulsion::*;
pub use state::*;
pub use traj_blend::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of task-space components (3 position plus 3 orientation).
pub const TASK_DOF: usize = 6;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during PaddleCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum PaddleCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("The kinematic model has {model} joints but the parameters describe {params}")]
    JointCountMismatch { model: usize, params: usize },

    #[error("Expected {expected} joint weights but the parameters provide {found}")]
    WeightCountMismatch { expected: usize, found: usize },

    #[error("Invalid trajectory segment: {0}")]
    InvalidSegment(#[from] BlendError),
}
