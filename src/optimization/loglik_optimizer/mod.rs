//! loglik_optimizer — Argmin-backed maximizer for log-likelihoods.
//!
//! Purpose
//! -------
//! Turn a model's log-likelihood `ℓ(θ)` into an Argmin L-BFGS run and hand
//! back a normalized [`OptimOutcome`]. The multi-start fitter drives this
//! layer once per random starting point through the [`Optimizer`] trait.
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] exposes `c(θ) = -ℓ(θ)` and its gradient to
//!   Argmin, falling back to finite differences when the model has no
//!   analytic gradient.
//! - [`maximize`] validates the starting point with [`LogLikelihood::check`],
//!   builds the solver for the configured [`LineSearcher`] and runs it.
//! - [`MLEOptions`] implements [`Optimizer`], so the fitter can accept any
//!   other strategy with the same contract.
//!
//! Invariants & assumptions
//! ------------------------
//! - The layer always maximizes `ℓ(θ)`; user code never implements the cost.
//! - [`LogLikelihood::value`] and [`LogLikelihood::grad`] report invalid
//!   inputs as [`OptError`] values, never panics.
//! - [`Tolerances`] and [`MLEOptions`] are validated on construction.
//!
//! Conventions
//! -----------
//! - `θ` is unconstrained; the exp link to the sBG shape parameters lives in
//!   the model layer.
//! - [`OptimOutcome::value`] is reported on the log-likelihood scale.
//! - Errors bubble up as [`OptResult<T>`] / [`OptError`].
//!
//! Testing notes
//! -------------
//! - Submodules test solver construction, sign conventions, finite-difference
//!   fallbacks and option validation on toy objectives.
//! - The sBG integration tests exercise [`maximize`] end to end.
//!
//! [`OptResult<T>`]: crate::optimization::errors::OptResult
//! [`OptError`]: crate::optimization::errors::OptError

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{
    LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Optimizer, Tolerances,
};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{
        LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Optimizer, Tolerances,
    };
    pub use super::types::{Cost, Grad, Theta};
}
