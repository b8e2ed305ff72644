//! Errors for the shifted-Beta-Geometric survival stack.
//!
//! [`SurvivalError`] covers dataset validation, numerical breakdowns of the
//! likelihood, fitting outcomes, and configuration mistakes. Every variant
//! belongs to exactly one [`ErrorKind`], which is what the multi-start fitter
//! uses to decide whether a failure is local to one restart or fatal to the
//! whole fit.
//!
//! ## Conventions
//! - Cohort and period indices are 0-based.
//! - Category labels are carried as their `Debug` rendering so the error type
//!   stays independent of the caller's category type.
//! - Optimizer errors that are not model errors travel boxed in
//!   [`SurvivalError::Optimizer`].
#[cfg(feature = "python-bindings")]
use pyo3::{
    PyErr,
    exceptions::{PyRuntimeError, PyValueError},
};

use crate::optimization::errors::OptError;

/// Result alias for survival-model operations.
pub type SurvivalResult<T> = Result<T, SurvivalError>;

/// Coarse classification of a [`SurvivalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input data; detected before any optimization work.
    InvalidDataset,
    /// A likelihood evaluation broke down numerically; local to one restart.
    NumericDegeneracy,
    /// The fit as a whole produced no usable optimum.
    FittingFailure,
    /// Invalid fit or optimizer configuration; rejected up front.
    ConfigurationError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurvivalError {
    // ---- Dataset ----
    /// The dataset holds no categories.
    EmptyDataset,

    /// A category was supplied without any cohort.
    NoCohorts { category: String },

    /// A cohort's observed horizon is shorter than two periods.
    CohortTooShort { len: usize },

    /// `active` and `lost` storage differ in length.
    CountLengthMismatch { active: usize, lost: usize },

    /// The declared horizon reads past the stored counts.
    HorizonExceedsStorage { len: usize, storage: usize },

    /// Active counts must be non-increasing within the horizon.
    ActiveCountIncreased { period: usize, previous: u64, current: u64 },

    /// Data references a category the indicator map does not know.
    UnknownCategory { category: String },

    /// Dataset and indicator map disagree on the number of categories.
    CategorySetMismatch { expected: usize, found: usize },

    // ---- Numerics ----
    /// Shape parameters must be finite and strictly positive.
    InvalidShape { alpha: f64, beta: f64 },

    /// The retention recursion needs at least two periods.
    HorizonTooShort { num_periods: usize },

    /// The aggregated log-likelihood is NaN or infinite.
    NonFiniteLogLik { value: f64 },

    /// Nobody survives to the start of `period`, so its hazard is undefined.
    NoSurvivors { period: usize },

    /// Coefficient vector length differs from `2 · n_categories`.
    CoefficientLengthMismatch { expected: usize, found: usize },

    /// A coefficient is NaN or infinite.
    NonFiniteCoefficient { index: usize, value: f64 },

    // ---- Fitting ----
    /// No restart produced a converged, finite optimum.
    FittingFailure { restarts: usize, failed: usize, last_status: String },

    /// The fit was cancelled before any restart produced a candidate.
    FitCancelled { completed: usize },

    /// Fitted quantities were requested before a successful fit.
    ModelNotFitted,

    // ---- Configuration ----
    /// The number of restarts must be at least one.
    InvalidRestarts { restarts: usize },

    /// Initial coefficients are drawn from `[low, high)`; needs `low < high`,
    /// with both bounds and the width finite.
    InvalidInitRange { low: f64, high: f64 },

    /// Non-model error raised by the optimizer layer.
    Optimizer(Box<OptError>),
}

impl SurvivalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SurvivalError::EmptyDataset
            | SurvivalError::NoCohorts { .. }
            | SurvivalError::CohortTooShort { .. }
            | SurvivalError::CountLengthMismatch { .. }
            | SurvivalError::HorizonExceedsStorage { .. }
            | SurvivalError::ActiveCountIncreased { .. }
            | SurvivalError::UnknownCategory { .. }
            | SurvivalError::CategorySetMismatch { .. } => ErrorKind::InvalidDataset,

            SurvivalError::InvalidShape { .. }
            | SurvivalError::HorizonTooShort { .. }
            | SurvivalError::NonFiniteLogLik { .. }
            | SurvivalError::NoSurvivors { .. }
            | SurvivalError::CoefficientLengthMismatch { .. }
            | SurvivalError::NonFiniteCoefficient { .. } => ErrorKind::NumericDegeneracy,

            SurvivalError::FittingFailure { .. }
            | SurvivalError::FitCancelled { .. }
            | SurvivalError::ModelNotFitted => ErrorKind::FittingFailure,

            SurvivalError::InvalidRestarts { .. } | SurvivalError::InvalidInitRange { .. } => {
                ErrorKind::ConfigurationError
            }

            SurvivalError::Optimizer(inner) => match inner.as_ref() {
                OptError::Model(err) => err.kind(),
                OptError::InvalidTolGrad { .. }
                | OptError::InvalidTolCost { .. }
                | OptError::InvalidMaxIter { .. }
                | OptError::NoTolerancesProvided
                | OptError::InvalidLineSearch { .. }
                | OptError::InvalidLBFGSMem { .. } => ErrorKind::ConfigurationError,
                other if other.is_numeric() => ErrorKind::NumericDegeneracy,
                _ => ErrorKind::FittingFailure,
            },
        }
    }
}

impl std::error::Error for SurvivalError {}

impl std::fmt::Display for SurvivalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Dataset ----
            SurvivalError::EmptyDataset => write!(f, "Dataset contains no categories."),
            SurvivalError::NoCohorts { category } => {
                write!(f, "Category {category} has no cohorts.")
            }
            SurvivalError::CohortTooShort { len } => {
                write!(f, "Cohort horizon must span at least 2 periods; got {len}.")
            }
            SurvivalError::CountLengthMismatch { active, lost } => {
                write!(f, "Active counts ({active}) and lost counts ({lost}) differ in length.")
            }
            SurvivalError::HorizonExceedsStorage { len, storage } => {
                write!(f, "Cohort horizon {len} exceeds stored periods {storage}.")
            }
            SurvivalError::ActiveCountIncreased { period, previous, current } => {
                write!(
                    f,
                    "Active count increased at period {period}: {previous} -> {current}. \
                     Active counts must be non-increasing."
                )
            }
            SurvivalError::UnknownCategory { category } => {
                write!(f, "Category {category} is not part of the indicator map.")
            }
            SurvivalError::CategorySetMismatch { expected, found } => {
                write!(f, "Category count mismatch: expected {expected}, found {found}.")
            }

            // ---- Numerics ----
            SurvivalError::InvalidShape { alpha, beta } => {
                write!(f, "Shape parameters must be finite and > 0; got alpha={alpha}, beta={beta}.")
            }
            SurvivalError::HorizonTooShort { num_periods } => {
                write!(f, "Retention recursion needs at least 2 periods; got {num_periods}.")
            }
            SurvivalError::NonFiniteLogLik { value } => {
                write!(f, "Log-likelihood evaluated to a non-finite value: {value}")
            }
            SurvivalError::NoSurvivors { period } => {
                write!(f, "Survival reached 0 before period {period}; its hazard is undefined.")
            }
            SurvivalError::CoefficientLengthMismatch { expected, found } => {
                write!(f, "Coefficient vector length mismatch: expected {expected}, found {found}.")
            }
            SurvivalError::NonFiniteCoefficient { index, value } => {
                write!(f, "Coefficient at index {index} is non-finite: {value}")
            }

            // ---- Fitting ----
            SurvivalError::FittingFailure { restarts, failed, last_status } => {
                write!(
                    f,
                    "Fitting failed: {failed} of {restarts} restarts produced no usable optimum \
                     (last status: {last_status})."
                )
            }
            SurvivalError::FitCancelled { completed } => {
                write!(f, "Fit cancelled after {completed} restarts without a usable optimum.")
            }
            SurvivalError::ModelNotFitted => write!(f, "Model has not been fitted yet."),

            // ---- Configuration ----
            SurvivalError::InvalidRestarts { restarts } => {
                write!(f, "Number of restarts must be at least 1; got {restarts}.")
            }
            SurvivalError::InvalidInitRange { low, high } => {
                write!(
                    f,
                    "Initial range must be finite with low < high and a finite width; \
                     got [{low}, {high})."
                )
            }
            SurvivalError::Optimizer(err) => write!(f, "Optimizer error: {err}"),
        }
    }
}

impl From<OptError> for SurvivalError {
    fn from(err: OptError) -> Self {
        match err {
            OptError::Model(inner) => inner,
            other => SurvivalError::Optimizer(Box::new(other)),
        }
    }
}

/// Fitting failures surface as `RuntimeError`, everything else as `ValueError`.
#[cfg(feature = "python-bindings")]
impl From<SurvivalError> for PyErr {
    fn from(err: SurvivalError) -> PyErr {
        match err.kind() {
            ErrorKind::FittingFailure => PyRuntimeError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}
