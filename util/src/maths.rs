//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Cholesky, DMatrix, DVector};
use num_traits::Float;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of times the damping is increased before the pseudo-inverse falls
/// back to a pure gradient direction.
const MAX_DAMPING_INCREASES: usize = 6;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Wrap an angle into the canonical range (-pi, pi].
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float + std::ops::Rem
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    let r = rem_euclid(angle + pi_t, tau_t);

    // The remainder is zero when the angle is an odd multiple of pi, which
    // maps to +pi in the half-open range.
    if r == T::from(0.0).unwrap() {
        pi_t
    }
    else {
        r - pi_t
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
/// This result is not an element of the function's codomain, but it is the
/// closest floating point number in the real numbers and thus fulfills the
/// property `self == self.div_euclid(rhs) * rhs + self.rem_euclid(rhs)`
/// approximatively.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float + std::ops::Mul + std::ops::Add + std::ops::Sub + std::ops::Rem
{
    let r = lhs % rhs;
    if r < T::from(0.0).unwrap() { r + rhs.abs() } else { r }
}

/// Damped weighted pseudo-inverse of a task Jacobian.
///
/// Computes `inv(J^T W1^2 J + gamma^2 W2^2) J^T W1^2`, where `W1` is the
/// diagonal task-space weight matrix, `W2` the diagonal joint-space weight
/// matrix and `gamma` a damping scalar which keeps the normal matrix
/// positive definite near singular configurations.
///
/// The result is always finite: if the factorisation fails the damping is
/// increased, and as a last resort the (scaled) gradient direction
/// `J^T W1^2` is returned.
pub fn weighted_damped_pinv(
    jac: &DMatrix<f64>,
    task_weights: &DVector<f64>,
    joint_weights: &DVector<f64>,
    damping: f64,
) -> DMatrix<f64> {
    let w1_sq = DMatrix::from_diagonal(&task_weights.component_mul(task_weights));
    let w2_sq = DMatrix::from_diagonal(&joint_weights.component_mul(joint_weights));

    let jt_w1_sq = jac.transpose() * w1_sq;

    let mut gamma = damping;

    for _ in 0..MAX_DAMPING_INCREASES {
        let normal = &jt_w1_sq * jac + &w2_sq * (gamma * gamma);

        if let Some(chol) = Cholesky::new(normal) {
            return chol.solve(&jt_w1_sq);
        }

        gamma *= 10.0;
    }

    jt_w1_sq * 1e-3
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 1f64), (0f64, 10f64), 0.5f64), 5f64);
        assert_eq!(lin_map((-1f64, 1f64), (0f64, 1f64), 0f64), 0.5f64);
    }

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(0f64)).abs() < 1e-12);
        assert!((wrap_pi(1f64) - 1f64).abs() < 1e-12);
        assert!((wrap_pi(-1f64) + 1f64).abs() < 1e-12);
        assert!((wrap_pi(4f64) - (4f64 - TAU)).abs() < 1e-12);
        assert!((wrap_pi(-4f64) - (TAU - 4f64)).abs() < 1e-12);
        assert!((wrap_pi(3f64 * PI) - PI).abs() < 1e-12);

        // Both pi and -pi map to +pi, the canonical range is (-pi, pi]
        assert!((wrap_pi(PI) - PI).abs() < 1e-12);
        assert!((wrap_pi(-PI) - PI).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_damped_pinv_recovers_inverse() {
        // With unit weights and negligible damping the pseudo-inverse of a
        // square well-conditioned matrix is its inverse.
        let jac = DMatrix::from_row_slice(3, 3, &[
            2.0, 0.0, 0.0,
            0.0, 3.0, 1.0,
            0.0, 0.0, 1.0,
        ]);
        let w1 = DVector::from_element(3, 1.0);
        let w2 = DVector::from_element(3, 1.0);

        let pinv = weighted_damped_pinv(&jac, &w1, &w2, 1e-8);
        let ident = &pinv * &jac;

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((ident[(i, j)] - expected).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_weighted_damped_pinv_finite_at_singularity() {
        // A rank-deficient Jacobian must still produce a finite result
        let jac = DMatrix::from_row_slice(2, 3, &[
            1.0, 1.0, 1.0,
            1.0, 1.0, 1.0,
        ]);
        let w1 = DVector::from_element(2, 1.0);
        let w2 = DVector::from_element(3, 1.0);

        let pinv = weighted_damped_pinv(&jac, &w1, &w2, 0.1);

        assert_eq!(pinv.nrows(), 3);
        assert_eq!(pinv.ncols(), 2);
        assert!(pinv.iter().all(|v| v.is_finite()));
    }
}
