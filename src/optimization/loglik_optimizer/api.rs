//! High-level entry point for maximizing a [`LogLikelihood`].
//!
//! Picks an L-BFGS solver with either Hager–Zhang or More–Thuente line
//! search, wraps the model in an [`ArgMinAdapter`] (which *minimizes*
//! `-ℓ(θ)`), and delegates the run to [`run_lbfgs`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, LogLikelihood, MLEOptions, Optimizer},
    },
};

/// Maximize `ℓ(θ)` from `theta0` using L-BFGS with `opts.line_searcher`.
///
/// # Errors
/// - Propagates any error from `f.check(theta0, data)`.
/// - Propagates builder errors (invalid tolerances or memory).
/// - Propagates runtime errors from the solver, including model errors
///   raised inside `value`/`grad` (recovered as `OptError::Model`).
///
/// # Example
/// ```
/// use ndarray::array;
/// use shifted_beta::optimization::errors::OptResult;
/// use shifted_beta::optimization::loglik_optimizer::{
///     maximize, LogLikelihood, MLEOptions, Theta,
/// };
///
/// struct Bowl;
/// impl LogLikelihood for Bowl {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Bowl, array![0.4, -0.3], &(), &MLEOptions::default())?;
/// assert!(out.theta_hat.iter().all(|t| t.abs() < 1e-4));
/// # Ok::<(), shifted_beta::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}

impl Optimizer for MLEOptions {
    fn maximize<F: LogLikelihood>(
        &self, f: &F, theta0: Theta, data: &F::Data,
    ) -> OptResult<OptimOutcome> {
        maximize(f, theta0, data, self)
    }
}
