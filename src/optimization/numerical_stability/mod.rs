//! numerical_stability — guarded scalar helpers shared by likelihood and
//! inference code.
//!
//! Purpose
//! -------
//! Keep the handful of numerically delicate operations in one place: the
//! `0 · ln 0 = 0` convention for count-weighted log terms, log-space sums,
//! overflow-aware exponentials for the log-linear link, and the eigenvalue
//! floor used when pseudo-inverting observed information.
//!
//! Invariants & assumptions
//! ------------------------
//! - Helpers are pure and never log or allocate.
//! - Callers decide whether a `−∞`/`None` result is an error; the helpers
//!   only make sure that zero-count terms can never produce one.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] cover the zero-count guard,
//!   `log_add_exp`, and the overflow/underflow reporting of `checked_exp`.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{EIGEN_EPS, checked_exp, log_add_exp, weighted_log};

pub mod prelude {
    pub use super::transformations::{EIGEN_EPS, checked_exp, log_add_exp, weighted_log};
}
