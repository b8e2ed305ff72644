//! loglik_optimizer::builders — L-BFGS solver construction.
//!
//! One builder per supported line search, both funnelling through
//! [`configure_lbfgs`] so tolerance wiring lives in a single place. The
//! builders never set `θ₀` or the iteration cap; those belong to the run
//! (see `run::run_lbfgs`), which lets one [`MLEOptions`] value configure
//! every restart of a multi-start fit.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::MLEOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HAGER_ZHANG_STEP_BOUNDS, HagerZhangLS,
            LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Theta,
        },
    },
};

/// L-BFGS with Hager–Zhang line search and the tolerances in `opts`.
///
/// The initial bracket is [`HAGER_ZHANG_STEP_BOUNDS`].
///
/// # Errors
/// - `OptError` when Argmin rejects a tolerance or the step bounds.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let (step_min, step_max) = HAGER_ZHANG_STEP_BOUNDS;
    let line_search = HagerZhangLS::new().with_bounds(step_min, step_max)?;
    configure_lbfgs(LbfgsHagerZhang::new(line_search, mem), opts)
}

/// L-BFGS with More–Thuente line search and the tolerances in `opts`.
///
/// # Errors
/// - `OptError` when Argmin rejects a tolerance.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsMoreThuente::new(MoreThuenteLS::new(), mem), opts)
}

/// Apply `tol_grad` / `tol_cost` when present; absent tolerances keep
/// Argmin's defaults.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}
