//! Guarded scalar helpers for likelihood and covariance code.
//!
//! # Provided items
//! - [`EIGEN_EPS`]: eigenvalue floor for pseudo-inverting observed
//!   information matrices.
//! - [`weighted_log`]: `count · ln p` from `ln p`, with the convention
//!   `0 · ln(0) = 0`.
//! - [`log_add_exp`]: `ln(eˣ + eʸ)` without forming either exponential.
//! - [`checked_exp`]: `exp(x)` reporting overflow/underflow instead of
//!   returning `∞`/`0`.

/// Eigenvalues of an observed information matrix at or below this value are
/// treated as zero when forming a pseudo-inverse.
pub const EIGEN_EPS: f64 = 1e-10;

/// `count · log_p`, with zero counts contributing exactly `0`.
///
/// A zero count short-circuits, so an underflowed `log_p = −∞` never turns
/// into `0 · (−∞) = NaN`. A positive count with `log_p = −∞` still yields
/// `−∞` and is left to the caller to reject.
#[inline]
pub fn weighted_log(count: u64, log_p: f64) -> f64 {
    if count == 0 { 0.0 } else { count as f64 * log_p }
}

/// `ln(eˣ + eʸ)`, finite whenever the larger argument is finite.
///
/// `y = −∞` is allowed and returns `x` (and vice versa), so `ln(a + 0)` needs
/// no special case.
#[inline]
pub fn log_add_exp(x: f64, y: f64) -> f64 {
    let (hi, lo) = if x >= y { (x, y) } else { (y, x) };
    if lo == f64::NEG_INFINITY {
        return hi;
    }
    hi + (lo - hi).exp().ln_1p()
}

/// `exp(x)` when the result is a positive normal `f64`, `None` otherwise.
#[inline]
pub fn checked_exp(x: f64) -> Option<f64> {
    let y = x.exp();
    (y.is_finite() && y > 0.0).then_some(y)
}
