//! Obstacle repulsion torques
//!
//! Computes joint torques pushing the forearm away from a wall, modelled as
//! an infinite line. The repulsive force acts at the point on the forearm
//! segment closest to the wall and is mapped into joint space through the
//! wrist Jacobian. Intended to be blended into a torque-level controller
//! downstream, the trajectory planner itself does not consume these.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{DVector, Matrix3, Vector3};
use serde::{Deserialize, Serialize};

// Internal
use crate::kin_model::KinematicModel;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for repulsion torque generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepulsionParams {
    /// A point on the wall line.
    ///
    /// Units: meters
    pub wall_point_m: [f64; 3],

    /// Direction of the wall line, normalised before use.
    pub wall_dir: [f64; 3],

    /// Number of joints up to and including the elbow.
    pub elbow_joints: usize,

    /// Number of joints up to and including the wrist.
    pub wrist_joints: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for RepulsionParams {
    fn default() -> Self {
        Self {
            wall_point_m: [0.0, 0.0, 0.3],
            wall_dir: [0.0, 1.0, 0.0],
            elbow_joints: 4,
            wrist_joints: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute repulsion torques for the given joint configuration.
///
/// Only the joints up to the wrist receive a torque, distal joints cannot
/// move the forearm. Returns a full-length torque vector with zeros for the
/// distal joints.
pub fn repulsion_torques(
    model: &dyn KinematicModel,
    q_rad: &DVector<f64>,
    params: &RepulsionParams,
) -> DVector<f64> {
    let num_joints = model.num_joints();
    let mut torques = DVector::zeros(num_joints);

    let wrist_task = model.fkin(&q_rad.rows(0, params.wrist_joints).into_owned());
    let elbow_task = model.fkin(&q_rad.rows(0, params.elbow_joints).into_owned());

    let wrist_pos = wrist_task.pos_m;
    let arm_dir = wrist_pos - elbow_task.pos_m;

    let wall_point = Vector3::from(params.wall_point_m);
    let wall_dir = Vector3::from(params.wall_dir).normalize();

    // Closest points between the wall line and the forearm segment. Solve
    // the linear system expressing the elbow-to-wall-point displacement in
    // the basis of the two line directions and their common normal
    let basis = Matrix3::from_columns(&[
        -wall_dir,
        wall_dir.cross(&arm_dir),
        arm_dir,
    ]);
    let coeffs = match basis.try_inverse() {
        Some(inv) => inv * (wall_point - elbow_task.pos_m),
        // Forearm parallel to the wall, no unique closest point
        None => return torques,
    };

    let lambda = coeffs[2].max(0.0).min(1.0);
    let closest_arm = elbow_task.pos_m + arm_dir * lambda;
    let closest_wall = wall_point + wall_dir * coeffs[0];

    let separation = closest_arm - closest_wall;
    let dist = separation.norm();
    if dist < 1e-9 {
        return torques;
    }

    // Inverse-square repulsive force at the closest arm point
    let force = separation / (dist * dist);
    let moment = (closest_arm - wrist_pos).cross(&force);

    for i in 0..params.wrist_joints {
        let jv: Vector3<f64> = wrist_task.jac_lin.column(i).into_owned();
        let jw: Vector3<f64> = wrist_task.jac_ang.column(i).into_owned();
        torques[i] = jv.dot(&force) + jw.dot(&moment);
    }

    torques
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::kin_model::{ChainParams, SerialChain};

    #[test]
    fn test_torques_finite_and_distal_joints_unloaded() {
        let chain = SerialChain::from_params(&ChainParams::default()).unwrap();
        let params = RepulsionParams::default();

        let q = DVector::from_vec(vec![0.3, -0.9, 0.4, -1.2, 0.6, 0.2, -0.1]);
        let torques = repulsion_torques(&chain, &q, &params);

        assert_eq!(torques.len(), 7);
        for t in torques.iter() {
            assert!(t.is_finite());
        }
        for i in params.wrist_joints..7 {
            assert_eq!(torques[i], 0.0);
        }
        assert!(torques.norm() > 0.0);
    }
}
