//! # Paddle arm library.
//!
//! This library allows other crates in the workspace to access items defined
//! inside the arm crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Ball simulation module - deterministic stand-in for the external ball observer feed
pub mod ball_sim;

/// Kinematic model - maps joint configurations to task-space pose and Jacobians
pub mod kin_model;

/// Paddle control module - interception planning and per-tick joint command generation
pub mod paddle_ctrl;
