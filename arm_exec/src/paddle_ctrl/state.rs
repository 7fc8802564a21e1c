//! State structures and processing for the PaddleCtrl module

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use nalgebra::{DVector, Matrix3, Vector3};
use serde::Serialize;

// Internal
use super::{
    IkError, IkGoal, IkSolver, ImpactError, ImpactPredictor, PaddleCtrlError,
    Params, TrajectorySegment,
};
use crate::kin_model::KinematicModel;
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Paddle control module.
pub struct PaddleCtrl {
    /// Parameters for the module.
    params: Params,

    /// Kinematic model of the arm.
    model: Box<dyn KinematicModel>,

    /// IK solver configured from the parameters.
    ik_solver: IkSolver,

    /// Ballistic impact predictor configured from the parameters.
    predictor: ImpactPredictor,

    /// Current mode of the controller.
    mode: PaddleCtrlMode,

    /// Active joint-space trajectory segment.
    segment: TrajectorySegment,

    /// Joint and task state as of the last processing cycle.
    engine_state: EngineState,
}

/// Joint and task state tracked between cycles.
#[derive(Debug, Clone)]
struct EngineState {
    q_rad: DVector<f64>,
    qd_rads: DVector<f64>,
    pos_m: Vector3<f64>,
    lin_vel_ms: Vector3<f64>,
    rot: Matrix3<f64>,
    ang_vel_rads: Vector3<f64>,
}

/// Input data to PaddleCtrl.
#[derive(Debug, Clone)]
pub struct InputData {
    /// Current control time.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Observed ball position.
    ///
    /// Units: meters
    pub ball_pos_m: Vector3<f64>,

    /// Observed ball velocity.
    ///
    /// Units: meters/second
    pub ball_vel_ms: Vector3<f64>,

    /// Point the ball should be redirected toward.
    ///
    /// Units: meters
    pub target_pos_m: Vector3<f64>,

    /// True on the cycle in which the ball was regenerated.
    pub ball_regenerated: bool,
}

/// Output data from PaddleCtrl, the joint command plus the expected paddle
/// task state for downstream consumers.
#[derive(Debug, Clone)]
pub struct OutputData {
    /// Commanded joint positions.
    ///
    /// Units: radians
    pub q_rad: DVector<f64>,

    /// Commanded joint rates.
    ///
    /// Units: radians/second
    pub qd_rads: DVector<f64>,

    /// Paddle centre position at the commanded configuration.
    ///
    /// Units: meters
    pub pos_m: Vector3<f64>,

    /// Paddle linear velocity at the commanded configuration.
    ///
    /// Units: meters/second
    pub lin_vel_ms: Vector3<f64>,

    /// Paddle orientation at the commanded configuration.
    pub rot: Matrix3<f64>,

    /// Paddle angular velocity at the commanded configuration.
    ///
    /// Units: radians/second
    pub ang_vel_rads: Vector3<f64>,

    /// Human readable diagnostic line, empty when nothing noteworthy
    /// happened this cycle.
    pub diag: String,
}

/// Status report on the operation of PaddleCtrl during a cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    /// Mode at the end of the cycle.
    pub mode: PaddleCtrlMode,

    /// True if a replan was attempted and no impact point was found.
    pub impact_not_found: bool,

    /// True if a replan was attempted and the IK solver did not converge.
    pub ik_not_converged: bool,

    /// Iterations taken by the IK solver, if a solve succeeded this cycle.
    pub ik_iterations: Option<usize>,

    /// Time to the predicted impact, if a replan succeeded this cycle.
    pub time_to_impact_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Mode of the paddle controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PaddleCtrlMode {
    /// Following a trajectory toward a predicted impact.
    Tracking,

    /// Returning to (or holding) the idle pose.
    IdleReturn,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PaddleCtrlMode {
    fn default() -> Self {
        Self::IdleReturn
    }
}

impl PaddleCtrl {
    /// Create a new instance of the paddle controller.
    ///
    /// Loads the parameter file at `params_path` and validates it against
    /// the given kinematic model.
    pub fn init(
        params_path: &str,
        model: Box<dyn KinematicModel>,
    ) -> Result<Self, PaddleCtrlError> {
        let params: Params = params::load(params_path)?;
        Self::with_params(params, model)
    }

    /// Create a new instance from in-memory parameters.
    pub fn with_params(
        params: Params,
        model: Box<dyn KinematicModel>,
    ) -> Result<Self, PaddleCtrlError> {
        let num_joints = model.num_joints();

        if params.idle_pose_rad.len() != num_joints {
            return Err(PaddleCtrlError::JointCountMismatch {
                model: num_joints,
                params: params.idle_pose_rad.len(),
            });
        }
        if params.ik_joint_weights.len() != num_joints {
            return Err(PaddleCtrlError::WeightCountMismatch {
                expected: num_joints,
                found: params.ik_joint_weights.len(),
            });
        }

        let ik_solver = IkSolver::new(&params);
        let predictor = ImpactPredictor::new(&params);

        // Start at rest in the idle pose, holding it with a trivial
        // segment until the first ball appears
        let idle = DVector::from_vec(params.idle_pose_rad.clone());
        let segment = TrajectorySegment::new(
            0.0,
            params.idle_return_duration_s,
            idle.clone(),
            DVector::zeros(num_joints),
            &idle,
            DVector::zeros(num_joints),
        )?;

        let task = model.fkin(&idle);
        let engine_state = EngineState {
            q_rad: idle,
            qd_rads: DVector::zeros(num_joints),
            pos_m: task.pos_m,
            lin_vel_ms: Vector3::zeros(),
            rot: task.rot,
            ang_vel_rads: Vector3::zeros(),
        };

        Ok(Self {
            params,
            model,
            ik_solver,
            predictor,
            mode: PaddleCtrlMode::IdleReturn,
            segment,
            engine_state,
        })
    }

    /// Perform a cycle of processing.
    ///
    /// Replans on ball regeneration, falls back to an idle return when the
    /// active segment expires, then samples the active segment to produce
    /// the joint command for this cycle.
    pub fn proc(
        &mut self,
        input: &InputData,
    ) -> Result<(OutputData, StatusReport), PaddleCtrlError> {
        let mut report = StatusReport::default();
        let mut diag = String::new();

        if input.ball_regenerated {
            diag = self.replan(input, &mut report)?;
        }

        if self.segment.expired(input.time_s) {
            self.open_idle_segment(input.time_s)?;
        }

        // Sample the active segment and derive the paddle task state from
        // the commanded joint state
        let (q_rad, qd_rads) = self.segment.sample(input.time_s);
        let task = self.model.fkin(&q_rad);
        let lin = &task.jac_lin * &qd_rads;
        let ang = &task.jac_ang * &qd_rads;

        self.engine_state = EngineState {
            q_rad: q_rad.clone(),
            qd_rads: qd_rads.clone(),
            pos_m: task.pos_m,
            lin_vel_ms: Vector3::new(lin[0], lin[1], lin[2]),
            rot: task.rot,
            ang_vel_rads: Vector3::new(ang[0], ang[1], ang[2]),
        };

        report.mode = self.mode;

        Ok((
            OutputData {
                q_rad,
                qd_rads,
                pos_m: self.engine_state.pos_m,
                lin_vel_ms: self.engine_state.lin_vel_ms,
                rot: self.engine_state.rot,
                ang_vel_rads: self.engine_state.ang_vel_rads,
                diag,
            },
            report,
        ))
    }

    /// Replan for a newly regenerated ball.
    ///
    /// Failures here are recoverable, the controller returns to idle and
    /// waits for the next regeneration.
    fn replan(
        &mut self,
        input: &InputData,
        report: &mut StatusReport,
    ) -> Result<String, PaddleCtrlError> {
        let impact = match self.predictor.predict(
            &input.ball_pos_m,
            &input.ball_vel_ms,
            &input.target_pos_m,
        ) {
            Ok(impact) => impact,
            Err(e @ ImpactError::NoImpactFound(_)) => {
                report.impact_not_found = true;
                self.open_idle_segment(input.time_s)?;
                return Ok(format!(
                    "No impact found, returning to idle: {}", e
                ));
            }
        };

        let goal = IkGoal {
            pos_m: impact.pos_m,
            rot: impact.rot,
            lin_vel_ms: impact.lin_vel_ms,
            ang_vel_rads: impact.ang_vel_rads,
        };

        let solution = match self.ik_solver.solve(
            self.model.as_ref(),
            &self.engine_state.q_rad,
            &goal,
        ) {
            Ok(solution) => solution,
            Err(e @ IkError::NotConverged { .. }) => {
                warn!("IK did not converge during replan: {}", e);
                if let IkError::NotConverged {
                    error_norm_trace, ..
                } = &e
                {
                    debug!(
                        "IK error norm trace (last 5): {:?}",
                        &error_norm_trace
                            [error_norm_trace.len().saturating_sub(5)..]
                    );
                }
                report.ik_not_converged = true;
                self.open_idle_segment(input.time_s)?;
                return Ok(format!(
                    "IK did not converge, returning to idle: {}", e
                ));
            }
        };

        report.ik_iterations = Some(solution.iterations);
        report.time_to_impact_s = Some(impact.time_to_impact_s);

        self.segment = TrajectorySegment::new(
            input.time_s,
            input.time_s + impact.time_to_impact_s,
            self.engine_state.q_rad.clone(),
            self.engine_state.qd_rads.clone(),
            &solution.q_rad,
            solution.qd_rads,
        )?;
        self.mode = PaddleCtrlMode::Tracking;

        Ok(format!(
            "Expected impact in {:.3} s at [{:.3}, {:.3}, {:.3}] m",
            impact.time_to_impact_s,
            impact.pos_m.x,
            impact.pos_m.y,
            impact.pos_m.z
        ))
    }

    /// Open a segment from the current state back to the idle pose.
    fn open_idle_segment(&mut self, time_s: f64) -> Result<(), PaddleCtrlError> {
        let num_joints = self.model.num_joints();
        let idle = DVector::from_vec(self.params.idle_pose_rad.clone());

        self.segment = TrajectorySegment::new(
            time_s,
            time_s + self.params.idle_return_duration_s,
            self.engine_state.q_rad.clone(),
            self.engine_state.qd_rads.clone(),
            &idle,
            DVector::zeros(num_joints),
        )?;
        self.mode = PaddleCtrlMode::IdleReturn;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
