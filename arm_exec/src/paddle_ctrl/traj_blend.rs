//! Joint-space trajectory blending
//!
//! Interpolates smooth joint motion between two boundary states with a
//! quintic polynomial per joint. Position and velocity match both boundary
//! conditions exactly and the boundary accelerations are zero. The per-joint
//! deltas are wrapped into (-pi, pi] so the arm always takes the shortest
//! path between equivalent angles.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::DVector;

// Internal
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when constructing a trajectory segment.
#[derive(Debug, thiserror::Error)]
pub enum BlendError {
    #[error("Segment end time ({t_end_s} s) is not after its start time ({t_start_s} s)")]
    NonPositiveDuration { t_start_s: f64, t_end_s: f64 },

    #[error("Boundary vectors have mismatched lengths")]
    DimensionMismatch,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A joint-space trajectory segment between two boundary states.
///
/// Segments are immutable once created. Replanning replaces the whole
/// segment rather than mutating it in place.
#[derive(Debug, Clone)]
pub struct TrajectorySegment {
    t_start_s: f64,
    t_end_s: f64,
    q_start_rad: DVector<f64>,
    qd_start_rads: DVector<f64>,
    qd_end_rads: DVector<f64>,

    /// Effective per-joint deltas, wrapped into (-pi, pi).
    delta_rad: DVector<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajectorySegment {
    /// Create a new segment between two boundary states.
    pub fn new(
        t_start_s: f64,
        t_end_s: f64,
        q_start_rad: DVector<f64>,
        qd_start_rads: DVector<f64>,
        q_end_rad: &DVector<f64>,
        qd_end_rads: DVector<f64>,
    ) -> Result<Self, BlendError> {
        if t_end_s <= t_start_s {
            return Err(BlendError::NonPositiveDuration { t_start_s, t_end_s });
        }

        let n = q_start_rad.len();
        if q_end_rad.len() != n
            || qd_start_rads.len() != n
            || qd_end_rads.len() != n
        {
            return Err(BlendError::DimensionMismatch);
        }

        let delta_rad = (q_end_rad - &q_start_rad).map(wrap_pi);

        Ok(Self {
            t_start_s,
            t_end_s,
            q_start_rad,
            qd_start_rads,
            qd_end_rads,
            delta_rad,
        })
    }

    /// The time at which the segment starts.
    pub fn t_start_s(&self) -> f64 {
        self.t_start_s
    }

    /// The time at which the segment ends.
    pub fn t_end_s(&self) -> f64 {
        self.t_end_s
    }

    /// True once the given time is past the end of the segment.
    pub fn expired(&self, t_s: f64) -> bool {
        t_s > self.t_end_s
    }

    /// Sample the segment at the given absolute time.
    ///
    /// Queries are clamped into the segment's time range, the caller is
    /// expected to replan before the segment expires.
    pub fn sample(&self, t_s: f64) -> (DVector<f64>, DVector<f64>) {
        let duration = self.t_end_s - self.t_start_s;
        let tau = (t_s - self.t_start_s).max(0.0).min(duration);

        let n = self.q_start_rad.len();
        let mut q = DVector::zeros(n);
        let mut qd = DVector::zeros(n);

        for i in 0..n {
            let dp = self.delta_rad[i];
            let v0 = self.qd_start_rads[i];
            let vf = self.qd_end_rads[i];

            // Quintic coefficients for boundary conditions with zero
            // acceleration at both ends (the constant and quadratic terms
            // vanish, the linear term is v0)
            let a3 = (20.0 * dp - (8.0 * vf + 12.0 * v0) * duration)
                / (2.0 * duration.powi(3));
            let a4 = (-30.0 * dp + (14.0 * vf + 16.0 * v0) * duration)
                / (2.0 * duration.powi(4));
            let a5 = (12.0 * dp - 6.0 * (vf + v0) * duration)
                / (2.0 * duration.powi(5));

            q[i] = self.q_start_rad[i]
                + v0 * tau
                + a3 * tau.powi(3)
                + a4 * tau.powi(4)
                + a5 * tau.powi(5);
            qd[i] = v0
                + 3.0 * a3 * tau.powi(2)
                + 4.0 * a4 * tau.powi(3)
                + 5.0 * a5 * tau.powi(4);
        }

        (q, qd)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use util::maths::wrap_pi;

    fn vec(values: &[f64]) -> DVector<f64> {
        DVector::from_row_slice(values)
    }

    #[test]
    fn test_boundary_exactness() {
        let q_start = vec(&[0.1, -0.4]);
        let q_end = vec(&[0.5, 0.2]);
        let qd_start = vec(&[0.2, -0.1]);
        let qd_end = vec(&[-0.3, 0.4]);

        let seg = TrajectorySegment::new(
            2.0, 2.7,
            q_start.clone(), qd_start.clone(),
            &q_end, qd_end.clone(),
        ).unwrap();

        let (q0, qd0) = seg.sample(2.0);
        assert!((&q0 - &q_start).norm() < 1e-12);
        assert!((&qd0 - &qd_start).norm() < 1e-12);

        let (qf, qdf) = seg.sample(2.7);
        assert!((&qf - &q_end).norm() < 1e-9);
        assert!((&qdf - &qd_end).norm() < 1e-9);
    }

    #[test]
    fn test_shortest_path_wrap() {
        // From 0 to 4 rad the short way round is backwards through
        // 4 - 2*pi = -2.283 rad
        let seg = TrajectorySegment::new(
            0.0, 1.0,
            vec(&[0.0]), vec(&[0.0]),
            &vec(&[4.0]), vec(&[0.0]),
        ).unwrap();

        let (q_mid, _) = seg.sample(0.5);
        assert!(q_mid[0] < 0.0, "interpolation took the long way round");

        let (q_end, _) = seg.sample(1.0);
        assert!(wrap_pi(q_end[0] - 4.0).abs() < 1e-9);
        assert!((q_end[0] - (4.0 - std::f64::consts::TAU)).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_stays_bounded() {
        let seg = TrajectorySegment::new(
            0.0, 2.0,
            vec(&[0.0]), vec(&[0.0]),
            &vec(&[1.0]), vec(&[0.0]),
        ).unwrap();

        // The rest-to-rest quintic peaks at 15/8 * dp / duration
        let (_, qd_mid) = seg.sample(1.0);
        assert!((qd_mid[0] - 15.0 / 16.0).abs() < 1e-9);

        for k in 0..=20 {
            let (_, qd) = seg.sample(0.1 * k as f64);
            assert!(qd[0].abs() <= 15.0 / 16.0 + 1e-9);
        }
    }

    #[test]
    fn test_sample_clamps_outside_range() {
        let seg = TrajectorySegment::new(
            0.0, 1.0,
            vec(&[0.0]), vec(&[0.0]),
            &vec(&[1.0]), vec(&[0.0]),
        ).unwrap();

        let (q, _) = seg.sample(5.0);
        assert!((q[0] - 1.0).abs() < 1e-9);

        let (q, _) = seg.sample(-5.0);
        assert!(q[0].abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        let result = TrajectorySegment::new(
            1.0, 1.0,
            vec(&[0.0]), vec(&[0.0]),
            &vec(&[1.0]), vec(&[0.0]),
        );
        assert!(matches!(
            result,
            Err(BlendError::NonPositiveDuration { .. })
        ));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let result = TrajectorySegment::new(
            0.0, 1.0,
            vec(&[0.0, 0.0]), vec(&[0.0, 0.0]),
            &vec(&[1.0]), vec(&[0.0, 0.0]),
        );
        assert!(matches!(result, Err(BlendError::DimensionMismatch)));
    }
}
