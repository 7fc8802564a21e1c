//! Serial revolute chain implementation of the kinematic model

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{DMatrix, DVector, Matrix3, Rotation3, Unit, Vector3};

// Internal
use super::{ChainParams, KinModelError, KinematicModel, TaskState};
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A serial chain of revolute joints with fixed inter-joint offsets.
pub struct SerialChain {
    /// Per-joint offset from the previous joint frame and unit rotation axis
    /// in the parent frame.
    joints: Vec<(Vector3<f64>, Vector3<f64>)>,

    /// Translation from the last joint frame to the paddle centre.
    tool_offset_m: Vector3<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SerialChain {
    /// Build a chain from parameters.
    pub fn from_params(params: &ChainParams) -> Result<Self, KinModelError> {
        if params.joints.is_empty() {
            return Err(KinModelError::EmptyChain);
        }

        let mut joints = Vec::with_capacity(params.joints.len());

        for (i, joint) in params.joints.iter().enumerate() {
            let axis = Vector3::from(joint.axis);

            if axis.norm() < 1e-9 {
                return Err(KinModelError::ZeroAxis(i));
            }

            joints.push((Vector3::from(joint.offset_m), axis.normalize()));
        }

        Ok(Self {
            joints,
            tool_offset_m: Vector3::from(params.tool_offset_m),
        })
    }

    /// Build a chain from a parameter file.
    pub fn from_param_file(param_file_path: &str) -> Result<Self, KinModelError> {
        let params: ChainParams = params::load(param_file_path)?;
        Self::from_params(&params)
    }
}

impl KinematicModel for SerialChain {
    fn num_joints(&self) -> usize {
        self.joints.len()
    }

    fn fkin(&self, q_rad: &DVector<f64>) -> TaskState {
        let n = q_rad.len().min(self.joints.len());

        let mut pos = Vector3::zeros();
        let mut rot = Matrix3::identity();

        // World-frame joint origins and axes, needed for the geometric
        // Jacobian below
        let mut origins = Vec::with_capacity(n);
        let mut axes = Vec::with_capacity(n);

        for i in 0..n {
            let (offset, axis) = &self.joints[i];

            pos += rot * offset;

            let axis_world = rot * axis;
            origins.push(pos);
            axes.push(axis_world);

            rot *= Rotation3::from_axis_angle(
                &Unit::new_unchecked(*axis),
                q_rad[i]
            ).into_inner();
        }

        // The tool transform only applies when the full chain is evaluated,
        // prefix queries return the joint origin itself
        if n == self.joints.len() {
            pos += rot * self.tool_offset_m;
        }

        let mut jac_lin = DMatrix::zeros(3, n);
        let mut jac_ang = DMatrix::zeros(3, n);

        for i in 0..n {
            let lin = axes[i].cross(&(pos - origins[i]));

            for r in 0..3 {
                jac_lin[(r, i)] = lin[r];
                jac_ang[(r, i)] = axes[i][r];
            }
        }

        TaskState {
            pos_m: pos,
            rot,
            jac_lin,
            jac_ang,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn test_chain() -> SerialChain {
        SerialChain::from_params(&ChainParams::default()).unwrap()
    }

    #[test]
    fn test_zero_config_pose() {
        let chain = test_chain();
        let task = chain.fkin(&DVector::zeros(7));

        // All offsets point along +Z, so the stretched arm reaches straight up
        assert!((task.pos_m - Vector3::new(0.0, 0.0, 1.25)).norm() < 1e-12);
        assert!((task.rot - Matrix3::identity()).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_orthonormal() {
        let chain = test_chain();
        let q = DVector::from_vec(vec![0.3, -1.1, 0.7, 0.5, -0.4, 1.2, -0.8]);
        let task = chain.fkin(&q);

        let should_be_ident = task.rot.transpose() * task.rot;
        assert!((should_be_ident - Matrix3::identity()).norm() < 1e-12);
        assert!((task.rot.determinant() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_jacobian_matches_finite_differences() {
        let chain = test_chain();
        let q = DVector::from_vec(vec![0.2, -0.9, 0.4, -1.3, 0.6, 0.8, -0.5]);
        let task = chain.fkin(&q);

        let h = 1e-7;
        for i in 0..7 {
            let mut q_plus = q.clone();
            let mut q_minus = q.clone();
            q_plus[i] += h;
            q_minus[i] -= h;

            let diff = (chain.fkin(&q_plus).pos_m - chain.fkin(&q_minus).pos_m)
                / (2.0 * h);

            for r in 0..3 {
                assert!(
                    (task.jac_lin[(r, i)] - diff[r]).abs() < 1e-5,
                    "jacobian mismatch at ({}, {})", r, i
                );
            }
        }
    }

    #[test]
    fn test_prefix_query_returns_joint_origin() {
        let chain = test_chain();
        let q = DVector::from_vec(vec![0.0, 0.0, 0.0, 0.0]);
        let task = chain.fkin(&q);

        // First four offsets sum to 0.75 m, with no tool transform applied
        assert!((task.pos_m - Vector3::new(0.0, 0.0, 0.75)).norm() < 1e-12);
        assert_eq!(task.jac_lin.ncols(), 4);
    }

    #[test]
    fn test_empty_chain_rejected() {
        let params = ChainParams {
            joints: vec![],
            tool_offset_m: [0.0, 0.0, 0.0],
        };
        assert!(matches!(
            SerialChain::from_params(&params),
            Err(KinModelError::EmptyChain)
        ));
    }
}
