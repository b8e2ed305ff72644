//! optimization — MLE stack, guarded numerics, and the optimizer error surface.
//!
//! Purpose
//! -------
//! Provide the model-agnostic half of fitting: an Argmin-backed L-BFGS
//! maximizer for anything implementing `LogLikelihood`, the `Optimizer`
//! seam through which fitters receive it, and the small set of numerically
//! guarded helpers that likelihood code relies on.
//!
//! Key behaviors
//! -------------
//! - `loglik_optimizer`: maximize `ℓ(θ)` from a starting point under
//!   validated tolerances, with analytic gradients when the model provides
//!   them and finite differences otherwise.
//! - `numerical_stability`: `0 · ln 0 = 0` weighting, `log_add_exp`, checked `exp`,
//!   and the eigenvalue floor used by `inference`.
//! - `errors`: `OptError` / `OptResult<T>`, with model errors carried
//!   through unchanged as `OptError::Model`.
//!
//! Conventions
//! -----------
//! - Solvers maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; outcomes are
//!   reported in terms of `ℓ`.
//! - Parameters live in an unconstrained space; any mapping into model
//!   space belongs to the model.
//! - Only per-run diagnostics are logged here (at `debug`/`trace`); fitting
//!   progress is reported by the callers.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
