//! Shifted-Beta-Geometric retention model: dataset, fit, and fitted output.
//!
//! [`ShiftedBetaModel`] owns a validated [`Dataset`] and the
//! [`ShiftedBetaLikelihood`] built from its categories. After a successful
//! [`ShiftedBetaModel::fit`], `results` holds the multi-start diagnostics and
//! `fitted_params` the per-category shapes; a failed fit leaves both empty so
//! stale parameters are never reported.
use std::{collections::BTreeMap, sync::atomic::AtomicBool};

use ndarray::Array1;

use crate::{
    inference::hessian::calc_standard_errors,
    optimization::loglik_optimizer::Optimizer,
    survival::{
        core::{
            cohort::{Category, Dataset},
            indicator::IndicatorMap,
            options::FitOptions,
            params::{FittedParameters, ModelParams, ShapeParams},
            retention::RetentionStats,
        },
        errors::{SurvivalError, SurvivalResult},
        models::{
            fitter::{FitOutcome, fit},
            likelihood::ShiftedBetaLikelihood,
        },
    },
};

/// sBG model over one categorical covariate.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftedBetaModel<C: Category> {
    pub dataset: Dataset<C>,
    pub likelihood: ShiftedBetaLikelihood<C>,
    /// Multi-start diagnostics (populated after `fit`).
    pub results: Option<FitOutcome>,
    /// Per-category shapes at the winning coefficients (populated after `fit`).
    pub fitted_params: Option<FittedParameters<C>>,
}

impl<C: Category> ShiftedBetaModel<C> {
    /// Build the indicator layout from the dataset's categories.
    pub fn new(dataset: Dataset<C>) -> Self {
        let likelihood = ShiftedBetaLikelihood::new(IndicatorMap::from_dataset(&dataset));
        Self { dataset, likelihood, results: None, fitted_params: None }
    }

    /// Fit with the built-in L-BFGS optimizer configured by `opts.mle_opts`.
    ///
    /// # Errors
    /// See [`ShiftedBetaModel::fit_with`].
    pub fn fit(&mut self, opts: &FitOptions) -> SurvivalResult<()> {
        let optimizer = opts.mle_opts.clone();
        self.fit_with(&optimizer, opts, None)
    }

    /// Fit with any [`Optimizer`], optionally observing a cancel flag.
    ///
    /// # Errors
    /// - Configuration errors from `opts`.
    /// - `FittingFailure` / `FitCancelled` when no restart is usable.
    /// - `InvalidShape` if the winning coefficients cannot be mapped back to
    ///   shapes.
    pub fn fit_with<O: Optimizer>(
        &mut self, optimizer: &O, opts: &FitOptions, cancel: Option<&AtomicBool>,
    ) -> SurvivalResult<()> {
        self.results = None;
        self.fitted_params = None;
        let outcome = fit(&self.likelihood, &self.dataset, optimizer, opts, cancel)?;
        let params =
            FittedParameters::from_theta(outcome.theta_hat.clone(), self.likelihood.indicators())?;
        self.results = Some(outcome);
        self.fitted_params = Some(params);
        Ok(())
    }

    /// Fitted `(α, β)` per category.
    ///
    /// # Errors
    /// - `ModelNotFitted` before a successful fit.
    pub fn coeffs(&self) -> SurvivalResult<&BTreeMap<C, ShapeParams>> {
        Ok(&self.fitted()?.shapes)
    }

    /// Coefficient layout; available without fitting.
    pub fn params(&self) -> ModelParams<C> {
        ModelParams::from_indicators(self.likelihood.indicators())
    }

    /// Winning coefficient vector.
    pub fn theta_hat(&self) -> SurvivalResult<&Array1<f64>> {
        Ok(&self.fitted()?.theta_hat)
    }

    /// Total negative log-likelihood at the fitted coefficients.
    pub fn negative_log_likelihood(&self) -> SurvivalResult<f64> {
        self.results.as_ref().map(|r| r.objective).ok_or(SurvivalError::ModelNotFitted)
    }

    /// Fitted churn and survival probabilities for periods `0..num_periods`.
    ///
    /// # Errors
    /// - `ModelNotFitted`, `UnknownCategory`, or `HorizonTooShort`.
    pub fn retention_curve(&self, category: &C, num_periods: usize) -> SurvivalResult<RetentionStats> {
        self.shape(category)?.retention(num_periods)
    }

    /// Fitted probability of churning in period `t >= 1` given survival to
    /// `t − 1`.
    ///
    /// # Errors
    /// - `ModelNotFitted`, `UnknownCategory`, or `HorizonTooShort` for `t == 0`.
    /// - `NoSurvivors` if the fitted survival has underflowed to 0 by `t − 1`.
    pub fn hazard(&self, category: &C, t: usize) -> SurvivalResult<f64> {
        let stats = self.retention_curve(category, t + 1)?;
        stats.hazard(t).ok_or(SurvivalError::NoSurvivors { period: t })
    }

    /// Classical standard errors of the fitted coefficient vector.
    ///
    /// # Errors
    /// - `ModelNotFitted` before a successful fit.
    /// - `Optimizer(..)` if the observed information is not finite.
    pub fn standard_errors(&self) -> SurvivalResult<Array1<f64>> {
        let theta_hat = self.theta_hat()?;
        let n = theta_hat.len();
        let neg_grad = |theta: &Array1<f64>| match self
            .likelihood
            .log_likelihood_grad(theta.view(), &self.dataset)
        {
            Ok(g) => -g,
            Err(_) => Array1::from_elem(n, f64::NAN),
        };
        Ok(calc_standard_errors(&neg_grad, theta_hat)?)
    }

    // ---- Helper methods ----

    fn fitted(&self) -> SurvivalResult<&FittedParameters<C>> {
        self.fitted_params.as_ref().ok_or(SurvivalError::ModelNotFitted)
    }

    fn shape(&self, category: &C) -> SurvivalResult<&ShapeParams> {
        self.fitted()?
            .get(category)
            .ok_or_else(|| SurvivalError::UnknownCategory { category: format!("{category:?}") })
    }
}
