//! shifted_beta — Shifted-Beta-Geometric customer retention models.
//!
//! Purpose
//! -------
//! Fit the sBG survival model to grouped cohort counts (customers active and
//! lost per period since acquisition) by multi-start maximum likelihood, with
//! one categorical covariate acting on both Beta shape parameters through a
//! log-linear link. When the `python-bindings` feature is enabled, this
//! module also defines the `_shifted_beta` extension module.
//!
//! Key behaviors
//! -------------
//! - [`survival`]: cohort containers, the churn/survival recursion, the
//!   log-likelihood and its gradient, and the multi-start fitter.
//! - [`optimization`]: the argmin-backed L-BFGS maximizer behind the
//!   [`Optimizer`](optimization::loglik_optimizer::Optimizer) seam.
//! - [`inference`]: standard errors from the observed information.
//!
//! Invariants & assumptions
//! ------------------------
//! - Data preparation happens upstream: callers hand in per-category lists
//!   of already aggregated `(active, lost)` count series.
//! - The PyO3 layer only converts inputs and maps errors; all numerical work
//!   lives in the inner modules.
//!
//! # Example
//! ```no_run
//! use shifted_beta::survival::{CohortSeries, Dataset, FitOptions, ShiftedBetaModel};
//!
//! let cohort = CohortSeries::new(vec![1000, 631, 468, 382, 326], vec![0, 369, 163, 86, 56])?;
//! let mut model = ShiftedBetaModel::new(Dataset::from_cohorts([("regular", cohort)])?);
//! model.fit(&FitOptions::with_restarts(10, Some(42))?)?;
//! let shape = model.coeffs()?[&"regular"];
//! println!("alpha = {:.3}, beta = {:.3}", shape.alpha, shape.beta);
//! # Ok::<(), shifted_beta::survival::SurvivalError>(())
//! ```

pub mod inference;
pub mod optimization;
pub mod survival;
pub mod utils;

#[cfg(feature = "python-bindings")]
use std::collections::BTreeMap;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    survival::{
        core::ModelParams,
        errors::SurvivalError,
        models::{FitOutcome, RestartStatus, ShiftedBetaModel},
    },
    utils::{extract_dataset, extract_fit_options},
};

/// ShiftedBeta — Python-facing sBG model over string categories.
///
/// Constructed from `dict[str, list[tuple[list[int], list[int]]]]`, one
/// `(active, lost)` pair per cohort. Structural problems in the data raise
/// `ValueError` at construction.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "_shifted_beta")]
pub struct ShiftedBeta {
    inner: ShiftedBetaModel<String>,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl ShiftedBeta {
    #[new]
    #[pyo3(text_signature = "(data, /)")]
    pub fn new<'py>(data: &Bound<'py, PyAny>) -> PyResult<Self> {
        Ok(ShiftedBeta { inner: ShiftedBetaModel::new(extract_dataset(data)?) })
    }

    /// Fit by multi-start maximum likelihood.
    ///
    /// Raises `RuntimeError` if no restart converges and `ValueError` for
    /// invalid options.
    #[pyo3(
        signature = (
            restarts = 50,
            seed = None,
            max_iter = None,
            tol_grad = None,
            line_searcher = None,
            parallel = true,
        ),
        text_signature = "(self, /, restarts=50, seed=None, max_iter=None, tol_grad=None, \
                          line_searcher='MoreThuente', parallel=True)"
    )]
    pub fn fit(
        &mut self, restarts: usize, seed: Option<u64>, max_iter: Option<usize>,
        tol_grad: Option<f64>, line_searcher: Option<&str>, parallel: bool,
    ) -> PyResult<()> {
        let opts = extract_fit_options(restarts, seed, max_iter, tol_grad, line_searcher, parallel)?;
        self.inner.fit(&opts)?;
        Ok(())
    }

    /// `{category: {"alpha": α, "beta": β}}` at the fitted coefficients.
    pub fn get_coeffs(&self) -> PyResult<BTreeMap<String, BTreeMap<String, f64>>> {
        Ok(self
            .inner
            .coeffs()?
            .iter()
            .map(|(category, shape)| {
                let entry = BTreeMap::from([
                    ("alpha".to_string(), shape.alpha),
                    ("beta".to_string(), shape.beta),
                ]);
                (category.clone(), entry)
            })
            .collect())
    }

    pub fn get_params(&self) -> ShiftedBetaParams {
        ShiftedBetaParams { inner: self.inner.params() }
    }

    /// `(churn, survival)` probabilities for periods `0..num_periods`.
    pub fn retention_curve(
        &self, category: String, num_periods: usize,
    ) -> PyResult<(Vec<f64>, Vec<f64>)> {
        let stats = self.inner.retention_curve(&category, num_periods)?;
        Ok((stats.churn, stats.survival))
    }

    pub fn hazard(&self, category: String, t: usize) -> PyResult<f64> {
        Ok(self.inner.hazard(&category, t)?)
    }

    pub fn standard_errors(&self) -> PyResult<Vec<f64>> {
        Ok(self.inner.standard_errors()?.to_vec())
    }

    #[getter]
    pub fn results(&self) -> PyResult<ShiftedBetaResults> {
        match &self.inner.results {
            Some(outcome) => Ok(ShiftedBetaResults { inner: outcome.clone() }),
            None => Err(SurvivalError::ModelNotFitted.into()),
        }
    }
}

/// Coefficient layout of a `ShiftedBeta` model.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "_shifted_beta")]
pub struct ShiftedBetaParams {
    inner: ModelParams<String>,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl ShiftedBetaParams {
    #[getter]
    pub fn n_categories(&self) -> usize {
        self.inner.n_categories
    }

    #[getter]
    pub fn categories(&self) -> Vec<String> {
        self.inner.categories.clone()
    }

    #[getter]
    pub fn indicators(&self) -> BTreeMap<String, Vec<bool>> {
        self.inner.indicators.clone()
    }
}

/// Multi-start diagnostics of the last successful fit.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "_shifted_beta")]
pub struct ShiftedBetaResults {
    inner: FitOutcome,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl ShiftedBetaResults {
    #[getter]
    pub fn theta_hat(&self) -> Vec<f64> {
        self.inner.theta_hat.to_vec()
    }

    /// Total negative log-likelihood at `theta_hat`.
    #[getter]
    pub fn objective(&self) -> f64 {
        self.inner.objective
    }

    #[getter]
    pub fn best_restart(&self) -> usize {
        self.inner.best_restart
    }

    #[getter]
    pub fn seed(&self) -> u64 {
        self.inner.seed
    }

    #[getter]
    pub fn iterations(&self) -> usize {
        self.inner.optim.iterations
    }

    #[getter]
    pub fn status(&self) -> String {
        self.inner.optim.status.clone()
    }

    /// Per restart: `None` when it was not a candidate, else its objective.
    #[getter]
    pub fn restart_objectives(&self) -> Vec<Option<f64>> {
        self.inner
            .restarts
            .iter()
            .map(|r| match r.status {
                RestartStatus::Candidate { objective, .. } => Some(objective),
                _ => None,
            })
            .collect()
    }
}

#[cfg(feature = "python-bindings")]
#[pymodule]
fn _shifted_beta<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<ShiftedBeta>()?;
    m.add_class::<ShiftedBetaParams>()?;
    m.add_class::<ShiftedBetaResults>()?;
    Ok(())
}
