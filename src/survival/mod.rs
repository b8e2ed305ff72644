//! survival — Shifted-Beta-Geometric retention models.
//!
//! Purpose
//! -------
//! Estimate per-category customer retention from grouped cohort counts.
//! Each customer churns with a constant, unobserved per-period probability
//! drawn from a category-specific `Beta(α, β)`; aggregate churn therefore
//! slows over time as the most churn-prone customers leave first.
//!
//! Key behaviors
//! -------------
//! - [`core`]: validated cohort containers, the category → coefficient
//!   layout, the period churn/survival recursion, and fit options.
//! - [`models`]: the grouped-data log-likelihood with its analytic
//!   gradient, the multi-start fitter, and the [`ShiftedBetaModel`] facade.
//! - [`errors`]: [`SurvivalError`] and its [`ErrorKind`] classification.
//!
//! Conventions
//! -----------
//! - Shapes are parameterized through a log-linear link,
//!   `α_c = exp(θ_α[0] + θ_α[c])` (the reference category uses only the
//!   intercept), and likewise for `β`.
//! - Fitting minimizes the negative log-likelihood; reported objectives are
//!   totals over all customers.

pub mod core;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::core::{
    Category, CohortSeries, Dataset, FitOptions, FittedParameters, IndicatorMap, InitRange,
    ModelParams, RetentionStats, ShapeParams,
};
pub use self::errors::{ErrorKind, SurvivalError, SurvivalResult};
pub use self::models::{FitOutcome, RestartStatus, ShiftedBetaLikelihood, ShiftedBetaModel};
