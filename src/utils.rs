//! PyO3 conversion helpers for the `ShiftedBeta` Python class.
#[cfg(feature = "python-bindings")]
use std::collections::BTreeMap;

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    optimization::loglik_optimizer::traits::{LineSearcher, MLEOptions, Tolerances},
    survival::{
        core::{CohortSeries, Dataset, FitOptions, InitRange},
        errors::SurvivalError,
    },
};

/// Convert `dict[str, list[tuple[list[int], list[int]]]]` into a [`Dataset`].
///
/// Each tuple is one cohort's `(active, lost)` counts; every cohort is
/// validated as it is converted.
#[cfg(feature = "python-bindings")]
pub fn extract_dataset<'py>(raw_data: &Bound<'py, PyAny>) -> PyResult<Dataset<String>> {
    let raw: BTreeMap<String, Vec<(Vec<u64>, Vec<u64>)>> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err(
            "expected a dict mapping category names to lists of (active, lost) count lists",
        )
    })?;
    let mut cohorts = BTreeMap::new();
    for (category, series) in raw {
        let list = series
            .into_iter()
            .map(|(active, lost)| CohortSeries::new(active, lost))
            .collect::<Result<Vec<_>, SurvivalError>>()?;
        cohorts.insert(category, list);
    }
    Ok(Dataset::new(cohorts)?)
}

/// Build [`FitOptions`] from the keyword arguments of `ShiftedBeta.fit`.
#[cfg(feature = "python-bindings")]
pub fn extract_fit_options(
    restarts: usize, seed: Option<u64>, max_iter: Option<usize>, tol_grad: Option<f64>,
    line_searcher: Option<&str>, parallel: bool,
) -> PyResult<FitOptions> {
    use std::str::FromStr;

    let defaults = MLEOptions::default();
    let tols = Tolerances::new(
        tol_grad.or(defaults.tols.tol_grad),
        defaults.tols.tol_cost,
        max_iter.or(defaults.tols.max_iter),
    )
    .map_err(SurvivalError::from)?;
    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name).map_err(SurvivalError::from)?,
        None => defaults.line_searcher,
    };
    let mle_opts = MLEOptions::new(tols, ls, false, None).map_err(SurvivalError::from)?;
    Ok(FitOptions::new(restarts, seed, InitRange::default(), mle_opts, parallel)?)
}
