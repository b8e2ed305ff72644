//! survival::core — data containers, coefficient layout, and the sBG recursion.
//!
//! - [`cohort`]: validated [`CohortSeries`] and [`Dataset`].
//! - [`indicator`]: [`IndicatorMap`] from categories to coefficient selections.
//! - [`retention`]: period churn/survival probabilities and their derivatives.
//! - [`params`]: the log-linear link, fitted shapes and layout metadata.
//! - [`options`]: [`FitOptions`] for multi-start fitting.

pub mod cohort;
pub mod indicator;
pub mod options;
pub mod params;
pub mod retention;

pub use self::cohort::{Category, CohortSeries, Dataset};
pub use self::indicator::{IndicatorMap, IndicatorVector};
pub use self::options::{FitOptions, InitRange};
pub use self::params::{FittedParameters, ModelParams, ShapeParams};
pub use self::retention::{
    LogRetention, MIN_HORIZON, RetentionStats, churn_probability, log_retention,
    retention_stats, survival_probability,
};
