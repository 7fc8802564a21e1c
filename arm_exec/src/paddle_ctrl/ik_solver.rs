//! Weighted damped-Newton inverse kinematics solver
//!
//! Iteratively drives the paddle pose toward a task-space goal using the
//! weighted damped pseudo-inverse of the stacked geometric Jacobian. Task
//! weights trade position accuracy against orientation accuracy, joint
//! weights bias the redundancy resolution toward the distal joints, and the
//! damping factor keeps the iteration finite near singular configurations.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

// Internal
use super::{Params, TASK_DOF};
use crate::kin_model::{KinematicModel, TaskState};
use util::maths::{weighted_damped_pinv, wrap_pi};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A task-space goal for the solver.
#[derive(Debug, Clone)]
pub struct IkGoal {
    /// Desired paddle centre position.
    ///
    /// Units: meters
    pub pos_m: Vector3<f64>,

    /// Desired paddle orientation.
    pub rot: Matrix3<f64>,

    /// Desired paddle linear velocity at the goal.
    ///
    /// Units: meters/second
    pub lin_vel_ms: Vector3<f64>,

    /// Desired paddle angular velocity at the goal.
    ///
    /// Units: radians/second
    pub ang_vel_rads: Vector3<f64>,
}

/// A converged solution.
#[derive(Debug, Clone)]
pub struct IkSolution {
    /// Joint configuration realising the goal pose, wrapped into (-pi, pi].
    ///
    /// Units: radians
    pub q_rad: DVector<f64>,

    /// Joint rates realising the goal twist at `q_rad`.
    ///
    /// Units: radians/second
    pub qd_rads: DVector<f64>,

    /// Number of iterations taken to converge.
    pub iterations: usize,
}

/// The IK solver itself. Holds the weighting configuration so each solve
/// only needs the model, the seed and the goal.
pub struct IkSolver {
    task_weights: DVector<f64>,
    joint_weights: DVector<f64>,
    ori_axis_mask: [bool; 3],
    damping_factor: f64,
    convergence_tol: f64,
    max_iterations: usize,
    step_fraction: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised by the solver.
#[derive(Debug, thiserror::Error)]
pub enum IkError {
    #[error(
        "Did not converge within {max_iterations} iterations \
        (final error norm {final_error_norm})"
    )]
    NotConverged {
        max_iterations: usize,
        final_error_norm: f64,
        error_norm_trace: Vec<f64>,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl IkSolver {
    /// Create a new solver from parameters.
    pub fn new(params: &Params) -> Self {
        Self {
            task_weights: DVector::from_row_slice(&params.ik_task_weights),
            joint_weights: DVector::from_row_slice(&params.ik_joint_weights),
            ori_axis_mask: params.ik_ori_axis_mask,
            damping_factor: params.ik_damping_factor,
            convergence_tol: params.ik_convergence_tol,
            max_iterations: params.ik_max_iterations,
            step_fraction: params.ik_step_fraction,
        }
    }

    /// Solve for a joint configuration and joint rates realising the goal.
    ///
    /// The seed should be close to the expected solution, the caller's
    /// current configuration is usually a good choice.
    pub fn solve(
        &self,
        model: &dyn KinematicModel,
        q_seed_rad: &DVector<f64>,
        goal: &IkGoal,
    ) -> Result<IkSolution, IkError> {
        let mut q = q_seed_rad.clone();
        let mut error_norm_trace = Vec::with_capacity(self.max_iterations);

        for iteration in 0..self.max_iterations {
            let task = model.fkin(&q);
            let error = self.task_error(&task, goal);
            let error_norm = error.norm();
            error_norm_trace.push(error_norm);

            let jac = stack_jacobian(&task);
            let pinv = weighted_damped_pinv(
                &jac,
                &self.task_weights,
                &self.joint_weights,
                self.damping_factor,
            );

            if error_norm < self.convergence_tol {
                // Converged, use the pseudo-inverse at the solution to map
                // the goal twist into joint rates
                let mut twist = DVector::zeros(TASK_DOF);
                for r in 0..3 {
                    twist[r] = goal.lin_vel_ms[r];
                    twist[r + 3] = goal.ang_vel_rads[r];
                }

                return Ok(IkSolution {
                    q_rad: q.map(wrap_pi),
                    qd_rads: &pinv * twist,
                    iterations: iteration,
                });
            }

            q += (&pinv * error) * self.step_fraction;
        }

        let final_error_norm = error_norm_trace
            .last()
            .copied()
            .unwrap_or(f64::INFINITY);

        Err(IkError::NotConverged {
            max_iterations: self.max_iterations,
            final_error_norm,
            error_norm_trace,
        })
    }

    /// Task-space error between the current pose and the goal.
    ///
    /// The position error is the straight displacement to the goal. The
    /// orientation error is the sum of half cross products between the
    /// corresponding rotation columns, restricted to the unmasked axes.
    fn task_error(&self, task: &TaskState, goal: &IkGoal) -> DVector<f64> {
        let pos_err = goal.pos_m - task.pos_m;

        let mut ori_err = Vector3::zeros();
        for c in 0..3 {
            if self.ori_axis_mask[c] {
                let cur: Vector3<f64> = task.rot.column(c).into_owned();
                let des: Vector3<f64> = goal.rot.column(c).into_owned();
                ori_err += 0.5 * cur.cross(&des);
            }
        }

        let mut error = DVector::zeros(TASK_DOF);
        for r in 0..3 {
            error[r] = pos_err[r];
            error[r + 3] = ori_err[r];
        }
        error
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Stack the linear and angular Jacobians into a single 6 by n matrix.
fn stack_jacobian(task: &TaskState) -> DMatrix<f64> {
    let n = task.jac_lin.ncols();
    let mut jac = DMatrix::zeros(TASK_DOF, n);
    jac.slice_mut((0, 0), (3, n)).copy_from(&task.jac_lin);
    jac.slice_mut((3, 0), (3, n)).copy_from(&task.jac_ang);
    jac
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::kin_model::SerialChain;
    use crate::kin_model::ChainParams;

    fn idle_pose() -> DVector<f64> {
        DVector::from_vec(Params::default().idle_pose_rad)
    }

    #[test]
    fn test_converges_to_reachable_goal() {
        let params = Params::default();
        let solver = IkSolver::new(&params);
        let chain = SerialChain::from_params(&ChainParams::default()).unwrap();

        // Build the goal from a perturbation of the idle pose so it is
        // certainly reachable
        let mut q_goal = idle_pose();
        let perturbation = [0.3, -0.2, 0.4, 0.3, -0.2, 0.1, 0.2];
        for (i, dq) in perturbation.iter().enumerate() {
            q_goal[i] += dq;
        }
        let goal_task = chain.fkin(&q_goal);

        let goal = IkGoal {
            pos_m: goal_task.pos_m,
            rot: goal_task.rot,
            lin_vel_ms: Vector3::new(0.1, -0.2, 0.3),
            ang_vel_rads: Vector3::zeros(),
        };

        let solution = solver.solve(&chain, &idle_pose(), &goal).unwrap();

        let solved_task = chain.fkin(&solution.q_rad);
        assert!(
            (solved_task.pos_m - goal.pos_m).norm() < params.ik_convergence_tol,
            "position error too large"
        );

        // Only the paddle normal is constrained by the default axis mask
        let z_cur: Vector3<f64> = solved_task.rot.column(2).into_owned();
        let z_des: Vector3<f64> = goal.rot.column(2).into_owned();
        assert!(z_cur.cross(&z_des).norm() < 10.0 * params.ik_convergence_tol);

        assert!(solution.iterations < params.ik_max_iterations);
        for q in solution.q_rad.iter() {
            assert!(*q > -std::f64::consts::PI && *q <= std::f64::consts::PI);
        }
    }

    #[test]
    fn test_unreachable_goal_reports_trace() {
        let params = Params::default();
        let solver = IkSolver::new(&params);
        let chain = SerialChain::from_params(&ChainParams::default()).unwrap();

        let goal = IkGoal {
            pos_m: Vector3::new(5.0, 5.0, 5.0),
            rot: Matrix3::identity(),
            lin_vel_ms: Vector3::zeros(),
            ang_vel_rads: Vector3::zeros(),
        };

        match solver.solve(&chain, &idle_pose(), &goal) {
            Err(IkError::NotConverged {
                max_iterations,
                final_error_norm,
                error_norm_trace,
            }) => {
                assert_eq!(max_iterations, params.ik_max_iterations);
                assert_eq!(error_norm_trace.len(), params.ik_max_iterations);
                assert!(final_error_norm.is_finite());
            }
            Ok(_) => panic!("goal 5 m away should not be reachable"),
        }
    }
}
