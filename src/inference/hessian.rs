//! inference::hessian — standard errors from the observed information.
//!
//! Purpose
//! -------
//! Turn a gradient callback of the negative log-likelihood into classical
//! standard errors of the fitted coefficient vector `θ̂`. The Hessian is
//! obtained by finite differences of the gradient and inverted through a
//! truncated symmetric eigendecomposition.
//!
//! Key behaviors
//! -------------
//! - [`compute_hessian`] differentiates the gradient map to obtain the
//!   observed information `J(θ̂)`; its symmetrized result is copied into a
//!   `nalgebra::DMatrix` by `fill_dmatrix`.
//! - `solve_for_se` takes the square root of the diagonal of the
//!   Moore–Penrose pseudoinverse `J⁺`.
//!
//! Invariants & assumptions
//! ------------------------
//! - The callback returns the gradient of the *negative* log-likelihood, so
//!   that `J(θ̂)` is positive semi-definite at a minimum.
//! - Eigenvalues at or below [`EIGEN_EPS`] are dropped. Directions the data
//!   do not identify (e.g. a category whose cohorts carry no churn signal)
//!   then contribute nothing instead of dividing by a vanishing curvature.
//!
//! Conventions
//! -----------
//! - The scale of the returned SEs follows the scale of the callback: a
//!   total log-likelihood yields SEs for the full sample.
//! - No explicit inverse is formed.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{Grad, Theta, finite_diff::compute_hessian},
    numerical_stability::EIGEN_EPS,
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Classical standard errors at `theta_hat`.
///
/// `f` maps `θ` to the gradient of the negative log-likelihood.
///
/// # Errors
/// - Propagates [`compute_hessian`] failures (non-finite or misshapen
///   Hessians), which is also how a failing gradient callback surfaces when
///   it signals trouble with NaN entries.
///
/// # Example
/// ```rust
/// # use ndarray::array;
/// # use shifted_beta::inference::hessian::calc_standard_errors;
/// // NLL gradient of a Gaussian quadratic with information diag(4, 1).
/// let a = array![[4.0, 0.0], [0.0, 1.0]];
/// let f = |theta: &ndarray::Array1<f64>| a.dot(theta);
///
/// let se = calc_standard_errors(&f, &array![1.0, -1.0])?;
/// assert!((se[0] - 0.5).abs() < 1e-6);
/// assert!((se[1] - 1.0).abs() < 1e-6);
/// # Ok::<(), shifted_beta::optimization::errors::OptError>(())
/// ```
pub fn calc_standard_errors<F: Fn(&Theta) -> Grad>(
    f: &F, theta_hat: &Array1<f64>,
) -> OptResult<Array1<f64>> {
    let n = theta_hat.len();
    let obs_info = compute_hessian(f, theta_hat)?;
    let mut obs_info_nalg = DMatrix::<f64>::zeros(n, n);
    fill_dmatrix(&obs_info, &mut obs_info_nalg);
    Ok(solve_for_se(obs_info_nalg, n))
}

// ---- Helper methods ----

/// Copy a square `ndarray` matrix into a preallocated `DMatrix`.
fn fill_dmatrix(obs_info: &Array2<f64>, obs_info_nalg: &mut DMatrix<f64>) {
    for ((i, j), &value) in obs_info.indexed_iter() {
        obs_info_nalg[(i, j)] = value;
    }
}

/// `sqrt(diag(J⁺))` with `Var(θ̂_i) = Σ_{k: λ_k > EIGEN_EPS} Q[i,k]² / λ_k`,
/// where `J = Q Λ Qᵀ`.
fn solve_for_se(obs_info_nalg: DMatrix<f64>, n: usize) -> Array1<f64> {
    let eigen = obs_info_nalg.symmetric_eigen();
    let q = eigen.eigenvectors;
    Array1::from_shape_fn(n, |i| {
        eigen
            .eigenvalues
            .iter()
            .enumerate()
            .filter(|(_, lambda)| **lambda > EIGEN_EPS)
            .map(|(k, &lambda)| q[(i, k)] * q[(i, k)] / lambda)
            .sum::<f64>()
            .sqrt()
    })
}
