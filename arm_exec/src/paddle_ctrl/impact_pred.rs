//! Ballistic impact prediction
//!
//! Forward-integrates the ball's ballistic flight to find where it first
//! enters the paddle's reachable region, then derives the paddle pose and
//! velocity needed there to redirect the ball onto the target.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Matrix3, Vector3};

// Internal
use super::{FlightTime, PaddleVelMode, Params};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Norm below which a direction vector is considered degenerate.
const MIN_NORM: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The paddle state required at the predicted impact.
#[derive(Debug, Clone)]
pub struct ImpactCondition {
    /// Predicted impact position.
    ///
    /// Units: meters
    pub pos_m: Vector3<f64>,

    /// Time from the prediction instant until impact.
    ///
    /// Units: seconds
    pub time_to_impact_s: f64,

    /// Paddle orientation at impact. The third column is the contact
    /// normal, bisecting the pre and post impact ball velocities.
    pub rot: Matrix3<f64>,

    /// Paddle linear velocity at impact.
    ///
    /// Units: meters/second
    pub lin_vel_ms: Vector3<f64>,

    /// Paddle angular velocity at impact.
    ///
    /// Units: radians/second
    pub ang_vel_rads: Vector3<f64>,
}

/// The predictor itself, holding the reach geometry and flight models.
pub struct ImpactPredictor {
    gravity_mss: Vector3<f64>,
    time_step_s: f64,
    num_steps: usize,
    sphere_centre_m: Vector3<f64>,
    entry_radius_m: f64,
    floor_height_m: f64,
    flight_time: FlightTime,
    paddle_vel_mode: PaddleVelMode,
    up_ref: Vector3<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised by the predictor.
#[derive(Debug, thiserror::Error)]
pub enum ImpactError {
    #[error("The ball does not enter the reachable region within {0} s")]
    NoImpactFound(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ImpactPredictor {
    /// Create a new predictor from parameters.
    pub fn new(params: &Params) -> Self {
        Self {
            gravity_mss: Vector3::new(0.0, 0.0, -params.gravity_mss),
            time_step_s: params.pred_time_step_s,
            num_steps: (params.pred_horizon_s / params.pred_time_step_s)
                .ceil() as usize,
            sphere_centre_m: Vector3::from(params.reach_sphere_centre_m),
            entry_radius_m: params.reach_sphere_radius_m
                * params.reach_entry_margin,
            floor_height_m: params.floor_height_m,
            flight_time: params.flight_time,
            paddle_vel_mode: params.paddle_vel_mode,
            up_ref: Vector3::from(params.paddle_up_ref),
        }
    }

    /// Predict the impact condition for a ball at the given state, aiming
    /// the redirected ball at the target.
    pub fn predict(
        &self,
        ball_pos_m: &Vector3<f64>,
        ball_vel_ms: &Vector3<f64>,
        target_pos_m: &Vector3<f64>,
    ) -> Result<ImpactCondition, ImpactError> {
        let (impact_pos, v_pre, time_to_impact_s) =
            self.find_entry(ball_pos_m, ball_vel_ms)?;

        // Invert the ballistic displacement over the assumed flight time to
        // get the velocity the ball must leave the paddle with
        let flight_s = match self.flight_time {
            FlightTime::Fixed(t) => t,
            FlightTime::DistanceProportional(k) => {
                k * (target_pos_m - impact_pos).norm()
            }
        };
        let v_post = (target_pos_m
            - impact_pos
            - self.gravity_mss * (0.5 * flight_s * flight_s))
            / flight_s;

        let rot = self.paddle_frame(&v_pre, &v_post);
        let normal: Vector3<f64> = rot.column(2).into_owned();

        let lin_vel_ms = match self.paddle_vel_mode {
            PaddleVelMode::Zero => Vector3::zeros(),
            PaddleVelMode::IncomingFraction(k) => v_pre * k,
            PaddleVelMode::NormalBlend => {
                normal * (0.5 * normal.dot(&(v_pre + v_post)))
            }
        };

        Ok(ImpactCondition {
            pos_m: impact_pos,
            time_to_impact_s,
            rot,
            lin_vel_ms,
            ang_vel_rads: Vector3::zeros(),
        })
    }

    /// Integrate the ball forward until it first enters the reachable
    /// region.
    fn find_entry(
        &self,
        ball_pos_m: &Vector3<f64>,
        ball_vel_ms: &Vector3<f64>,
    ) -> Result<(Vector3<f64>, Vector3<f64>, f64), ImpactError> {
        let mut pos = *ball_pos_m;
        let mut vel = *ball_vel_ms;

        for step in 1..=self.num_steps {
            pos += vel * self.time_step_s;
            vel += self.gravity_mss * self.time_step_s;

            let in_reach =
                (pos - self.sphere_centre_m).norm() < self.entry_radius_m;

            if in_reach && pos.z > self.floor_height_m {
                return Ok((pos, vel, step as f64 * self.time_step_s));
            }
        }

        Err(ImpactError::NoImpactFound(
            self.num_steps as f64 * self.time_step_s,
        ))
    }

    /// Build the paddle orientation at impact.
    ///
    /// The paddle normal (third column) bisects the reversed incoming and
    /// outgoing ball velocities, so a hard elastic reflection off the paddle
    /// face sends the ball out along the outgoing direction.
    fn paddle_frame(
        &self,
        v_pre: &Vector3<f64>,
        v_post: &Vector3<f64>,
    ) -> Matrix3<f64> {
        let dv = v_post - v_pre;
        let z = if dv.norm() > MIN_NORM {
            dv.normalize()
        } else {
            // Degenerate when no velocity change is needed, fall back to
            // the reference up direction
            self.up_ref.normalize()
        };

        let mut x = self.up_ref.cross(&z);
        if x.norm() < MIN_NORM {
            // Up reference is parallel to the normal, pick any axis
            // perpendicular to z
            x = Vector3::x().cross(&z);
        }
        let x = x.normalize();
        let y = z.cross(&x);

        Matrix3::from_columns(&[x, y, z])
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_vertical_drop_timing() {
        let params = Params::default();
        let pred = ImpactPredictor::new(&params);

        // Dropped from 2 m directly above the sphere centre, the ball
        // enters the reach region after falling
        // 2 - (0.6 + 0.9 * 0.3) = 1.13 m, so t = sqrt(2 * 1.13 / 9.82)
        let impact = pred
            .predict(
                &Vector3::new(0.0, 0.0, 2.0),
                &Vector3::zeros(),
                &Vector3::new(0.0, 2.0, 0.0),
            )
            .unwrap();

        let expected_t = (2.0 * 1.13 / 9.82_f64).sqrt();
        assert!(
            (impact.time_to_impact_s - expected_t).abs()
                < 2.0 * params.pred_time_step_s,
            "impact at {} s, expected about {} s",
            impact.time_to_impact_s,
            expected_t
        );
        assert!(impact.pos_m.z > params.floor_height_m);
    }

    #[test]
    fn test_prediction_deterministic() {
        let params = Params::default();
        let pred = ImpactPredictor::new(&params);

        let pos = Vector3::new(0.1, 0.8, 1.9);
        let vel = Vector3::new(0.0, -1.0, -0.5);
        let target = Vector3::new(0.0, 2.0, 0.0);

        let a = pred.predict(&pos, &vel, &target).unwrap();
        let b = pred.predict(&pos, &vel, &target).unwrap();

        assert_eq!(a.pos_m, b.pos_m);
        assert_eq!(a.time_to_impact_s, b.time_to_impact_s);
        assert_eq!(a.rot, b.rot);
        assert_eq!(a.lin_vel_ms, b.lin_vel_ms);
    }

    #[test]
    fn test_paddle_frame_geometry() {
        let params = Params::default();
        let pred = ImpactPredictor::new(&params);

        let impact = pred
            .predict(
                &Vector3::new(0.0, 0.0, 2.0),
                &Vector3::zeros(),
                &Vector3::new(0.0, 2.0, 0.0),
            )
            .unwrap();

        // Orthonormal right-handed frame
        let should_be_ident = impact.rot.transpose() * impact.rot;
        assert!((should_be_ident - Matrix3::identity()).norm() < 1e-9);
        assert!((impact.rot.determinant() - 1.0).abs() < 1e-9);

        // The normal must bisect the velocity change direction. Rebuild the
        // pre and post impact velocities to check
        let mut pos = Vector3::new(0.0, 0.0, 2.0);
        let mut vel = Vector3::zeros();
        let g = Vector3::new(0.0, 0.0, -params.gravity_mss);
        let steps =
            (impact.time_to_impact_s / params.pred_time_step_s).round() as usize;
        for _ in 0..steps {
            pos += vel * params.pred_time_step_s;
            vel += g * params.pred_time_step_s;
        }
        let flight_s = match params.flight_time {
            FlightTime::Fixed(t) => t,
            _ => panic!("default flight time model changed"),
        };
        let v_post = (Vector3::new(0.0, 2.0, 0.0)
            - impact.pos_m
            - g * (0.5 * flight_s * flight_s))
            / flight_s;
        let dv = (v_post - vel).normalize();
        let z: Vector3<f64> = impact.rot.column(2).into_owned();
        assert!(z.cross(&dv).norm() < 1e-9);
    }

    #[test]
    fn test_receding_ball_has_no_impact() {
        let params = Params::default();
        let pred = ImpactPredictor::new(&params);

        let result = pred.predict(
            &Vector3::new(0.0, 5.0, 2.0),
            &Vector3::new(0.0, 5.0, 5.0),
            &Vector3::new(0.0, 2.0, 0.0),
        );
        assert!(matches!(result, Err(ImpactError::NoImpactFound(_))));
    }
}
