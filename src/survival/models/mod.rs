//! survival::models — likelihood, multi-start fitter, and model facade.

pub mod fitter;
pub mod likelihood;
pub mod shifted_beta;

pub use self::fitter::{FitOutcome, RestartStatus, RestartSummary, fit};
pub use self::likelihood::{ShiftedBetaLikelihood, cohort_log_likelihood};
pub use self::shifted_beta::ShiftedBetaModel;
