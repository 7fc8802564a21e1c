//! Parameters structure for PaddleCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Ball flight duration assumed when inverting the ballistic displacement
/// equation for the post-impact velocity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum FlightTime {
    /// Fixed flight duration.
    ///
    /// Units: seconds
    Fixed(f64),

    /// Flight duration proportional to the impact-to-target distance.
    ///
    /// Units: seconds/meter
    DistanceProportional(f64),
}

/// Strategy for the desired paddle linear velocity at impact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum PaddleVelMode {
    /// Paddle stationary at impact.
    Zero,

    /// Fraction of the incoming ball velocity.
    IncomingFraction(f64),

    /// Mean of the pre and post impact ball velocities projected onto the
    /// contact normal.
    NormalBlend,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for paddle control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- REST CONFIGURATION ----
    /// Joint configuration of the idle (rest) pose.
    ///
    /// Units: radians
    pub idle_pose_rad: Vec<f64>,

    /// Time allowed for a return to the idle pose.
    ///
    /// Units: seconds
    pub idle_return_duration_s: f64,

    // ---- IK SOLVER ----
    /// Task-space weights, 3 position then 3 orientation components.
    pub ik_task_weights: [f64; 6],

    /// Joint-space weights. Low weights on proximal joints bias the
    /// null-space solution toward moving the distal joints preferentially.
    pub ik_joint_weights: Vec<f64>,

    /// Orientation axes (x, y, z columns) the task cares about. Masked-out
    /// axes are "don't care", e.g. spin about the paddle normal.
    pub ik_ori_axis_mask: [bool; 3],

    /// Damping factor guaranteeing invertibility of the weighted
    /// pseudo-inverse near singularities.
    pub ik_damping_factor: f64,

    /// Task error norm below which the Newton iteration has converged.
    pub ik_convergence_tol: f64,

    /// Iteration cap for a single solve.
    pub ik_max_iterations: usize,

    /// Fraction of the full Newton step applied each iteration.
    pub ik_step_fraction: f64,

    // ---- IMPACT PREDICTION ----
    /// Gravitational acceleration magnitude.
    ///
    /// Units: meters/second^2
    pub gravity_mss: f64,

    /// Forward-integration time step.
    ///
    /// Units: seconds
    pub pred_time_step_s: f64,

    /// Prediction horizon.
    ///
    /// Units: seconds
    pub pred_horizon_s: f64,

    /// Centre of the spherical region the paddle can reach.
    ///
    /// Units: meters
    pub reach_sphere_centre_m: [f64; 3],

    /// Radius of the spherical region the paddle can reach.
    ///
    /// Units: meters
    pub reach_sphere_radius_m: f64,

    /// Fraction of the radius inside which a sphere entry counts as an
    /// impact point.
    pub reach_entry_margin: f64,

    /// Height below which impact points are rejected.
    ///
    /// Units: meters
    pub floor_height_m: f64,

    /// Ball flight duration model used for the post-impact velocity.
    pub flight_time: FlightTime,

    /// Desired paddle velocity strategy at impact.
    pub paddle_vel_mode: PaddleVelMode,

    /// Reference up-vector used to pick the paddle's in-plane axis.
    pub paddle_up_ref: [f64; 3],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            idle_pose_rad: vec![
                -PI / 2.0,
                PI / 4.0,
                0.0,
                -PI / 2.0,
                -PI / 4.0,
                0.0,
                0.0,
            ],
            idle_return_duration_s: 1.5,
            ik_task_weights: [1.0, 1.0, 1.0, 10.0, 10.0, 10.0],
            ik_joint_weights: vec![0.3, 0.4, 0.5, 0.7, 1.0, 1.5, 1.5],
            ik_ori_axis_mask: [false, false, true],
            ik_damping_factor: 0.1,
            ik_convergence_tol: 1e-3,
            ik_max_iterations: 500,
            ik_step_fraction: 0.5,
            gravity_mss: 9.82,
            pred_time_step_s: 0.01,
            pred_horizon_s: 3.0,
            reach_sphere_centre_m: [0.0, 0.0, 0.6],
            reach_sphere_radius_m: 0.3,
            reach_entry_margin: 0.9,
            floor_height_m: 0.0,
            flight_time: FlightTime::Fixed(0.5),
            paddle_vel_mode: PaddleVelMode::NormalBlend,
            paddle_up_ref: [0.0, 1.0, 0.0],
        }
    }
}
