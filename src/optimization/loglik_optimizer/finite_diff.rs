//! loglik_optimizer::finite_diff — finite-difference gradient and Hessian helpers.
//!
//! Purpose
//! -------
//! Provide finite-difference gradients and Hessians with validation and
//! symmetry cleanup, so the rest of the optimizer and the inference layer
//! never call the `finitediff` API directly.
//!
//! Key behaviors
//! -------------
//! - [`run_fd_diff`]: forward-difference gradient with error capture. Used by
//!   the adapter when a model has no analytic gradient, or when central
//!   differences broke down.
//! - [`compute_hessian`]: central-difference Hessian of a gradient function,
//!   falling back to forward differences when validation fails, then
//!   symmetrized in place.
//!
//! Conventions
//! -----------
//! - Differences are taken with respect to the unconstrained coefficient
//!   vector `Theta`; the exp link to `(α, β)` is handled by the model.
//! - Errors raised inside an objective closure are parked in a shared
//!   `RefCell` and re-raised after differencing, since the `finitediff`
//!   closures must return plain `f64`.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        types::{Grad, Hessian, Theta},
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Forward-difference gradient of `func` at `theta`, with error capture.
///
/// Clears `closure_err`, differentiates, re-raises any error `func` parked
/// in the cell, and finally validates shape and finiteness.
///
/// # Errors
/// - Any error captured in `closure_err` (converted via `From<Error>`).
/// - `OptError::GradientDimMismatch` / `OptError::InvalidGradient` from
///   [`validate_grad`].
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// Finite-difference Hessian of a gradient function `f` at `theta`.
///
/// Central differences first; on any validation failure the forward
/// scheme is tried and only its validation error is surfaced. The
/// accepted matrix is symmetrized before returning.
///
/// # Errors
/// - `OptError::HessianDimMismatch` / `OptError::InvalidHessian` when the
///   forward-difference fallback also fails validation.
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut hess = theta.central_hessian(f);
    if validate_hessian(&hess, dim).is_err() {
        hess = theta.forward_hessian(f);
        validate_hessian(&hess, dim)?;
    }
    symmetrize_hess(&mut hess);
    Ok(hess)
}

// ---- Helper methods ----

/// Average each off-diagonal pair in place; the diagonal is untouched.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}
