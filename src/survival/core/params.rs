//! sBG parameters — coefficient vector, per-category shapes, and metadata.
//!
//! Purpose
//! -------
//! Convert between the unconstrained coefficient vector searched by the
//! optimizer and the positive shape parameters `(α, β)` of each category,
//! and package the fitted result for callers.
//!
//! Key behaviors
//! -------------
//! - [`validate_coefficients`] checks the length (`2 · n_categories`) and
//!   finiteness of a coefficient vector.
//! - [`log_shapes`] sums each category's selected coefficients into
//!   `(ln α, ln β)`; [`ShapeParams::from_coefficients`] exponentiates them,
//!   `α = exp(Σ selected alpha coefficients)`, and likewise for `β`.
//! - [`FittedParameters`] holds the winning coefficient vector and the
//!   derived shapes of every category; [`ModelParams`] describes the
//!   coefficient layout (category order and indicator vectors).
//!
//! Conventions
//! -----------
//! - Coefficient layout: `θ = (θ_α[0..n), θ_β[0..n))` with `n` the number of
//!   categories in canonical order; index 0 of each block is the intercept.
//! - The exp link guarantees positivity for any finite θ. Overflow to `∞`
//!   or underflow to `0` is reported as `InvalidShape`; the log-scale
//!   shapes used by the likelihood have no such limit.
use std::collections::BTreeMap;

use ndarray::{Array1, ArrayView1, s};

use crate::{
    optimization::numerical_stability::checked_exp,
    survival::{
        core::{
            cohort::Category,
            indicator::{IndicatorMap, IndicatorVector},
            retention::{
                RetentionStats, churn_probability, retention_stats, survival_probability,
            },
        },
        errors::{SurvivalError, SurvivalResult},
    },
};

/// Validate the length and finiteness of a coefficient vector.
///
/// # Errors
/// - `CoefficientLengthMismatch` if `theta.len() != expected`.
/// - `NonFiniteCoefficient` for the first NaN/±∞ entry.
pub fn validate_coefficients(theta: ArrayView1<'_, f64>, expected: usize) -> SurvivalResult<()> {
    if theta.len() != expected {
        return Err(SurvivalError::CoefficientLengthMismatch { expected, found: theta.len() });
    }
    if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(SurvivalError::NonFiniteCoefficient { index, value });
    }
    Ok(())
}

/// `(ln α, ln β)` of one category: the sums of its selected coefficients.
///
/// `theta` must already be validated against `2 · indicator.len()`.
///
/// # Errors
/// - `InvalidShape` if a sum overflows to `±∞`.
pub fn log_shapes(
    theta: ArrayView1<'_, f64>, indicator: &IndicatorVector,
) -> SurvivalResult<(f64, f64)> {
    let n = indicator.len();
    let log_alpha = indicator.combine(theta.slice(s![..n]));
    let log_beta = indicator.combine(theta.slice(s![n..]));
    if !log_alpha.is_finite() || !log_beta.is_finite() {
        return Err(SurvivalError::InvalidShape { alpha: log_alpha.exp(), beta: log_beta.exp() });
    }
    Ok((log_alpha, log_beta))
}

/// Shape parameters `(α, β)` of one category's Beta churn distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParams {
    pub alpha: f64,
    pub beta: f64,
}

impl ShapeParams {
    /// # Errors
    /// - `InvalidShape` unless both values are finite and `> 0`.
    pub fn new(alpha: f64, beta: f64) -> SurvivalResult<Self> {
        let ok = |x: f64| x.is_finite() && x > 0.0;
        if !ok(alpha) || !ok(beta) {
            return Err(SurvivalError::InvalidShape { alpha, beta });
        }
        Ok(Self { alpha, beta })
    }

    /// Apply the log-linear link for one category.
    ///
    /// `theta` must already be validated against `2 · indicator.len()`.
    ///
    /// # Errors
    /// - `InvalidShape` when `exp` overflows or underflows.
    pub fn from_coefficients(
        theta: ArrayView1<'_, f64>, indicator: &IndicatorVector,
    ) -> SurvivalResult<Self> {
        let (log_alpha, log_beta) = log_shapes(theta, indicator)?;
        match (checked_exp(log_alpha), checked_exp(log_beta)) {
            (Some(alpha), Some(beta)) => Ok(Self { alpha, beta }),
            _ => Err(SurvivalError::InvalidShape { alpha: log_alpha.exp(), beta: log_beta.exp() }),
        }
    }

    /// `P[1] = α / (α + β)`, the mean of the Beta churn distribution.
    pub fn period_one_churn(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Recursive `P` and `S` over `num_periods` periods.
    pub fn retention(&self, num_periods: usize) -> SurvivalResult<RetentionStats> {
        retention_stats(self.alpha, self.beta, num_periods)
    }

    pub fn churn_probability(&self, t: usize) -> SurvivalResult<f64> {
        churn_probability(self.alpha, self.beta, t)
    }

    pub fn survival_probability(&self, t: usize) -> SurvivalResult<f64> {
        survival_probability(self.alpha, self.beta, t)
    }
}

/// Fitted coefficient vector plus the shapes it implies for each category.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedParameters<C: Category> {
    pub theta_hat: Array1<f64>,
    pub shapes: BTreeMap<C, ShapeParams>,
}

impl<C: Category> FittedParameters<C> {
    /// Derive every category's shapes from `theta`.
    ///
    /// # Errors
    /// - Coefficient validation errors.
    /// - `InvalidShape` if the link degenerates for some category.
    pub fn from_theta(theta: Array1<f64>, indicators: &IndicatorMap<C>) -> SurvivalResult<Self> {
        validate_coefficients(theta.view(), indicators.n_coefficients())?;
        let shapes = indicators
            .iter()
            .map(|(c, ind)| Ok((c.clone(), ShapeParams::from_coefficients(theta.view(), ind)?)))
            .collect::<SurvivalResult<BTreeMap<_, _>>>()?;
        Ok(Self { theta_hat: theta, shapes })
    }

    pub fn get(&self, category: &C) -> Option<&ShapeParams> {
        self.shapes.get(category)
    }
}

/// Coefficient-layout metadata of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams<C: Category> {
    pub n_categories: usize,
    pub categories: Vec<C>,
    pub indicators: BTreeMap<C, Vec<bool>>,
}

impl<C: Category> ModelParams<C> {
    pub fn from_indicators(map: &IndicatorMap<C>) -> Self {
        Self {
            n_categories: map.n_categories(),
            categories: map.categories().to_vec(),
            indicators: map.iter().map(|(c, v)| (c.clone(), v.as_slice().to_vec())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Coefficient validation.
    // - The log-linear link for reference and non-reference categories.
    // - Degenerate links and layout metadata.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Length and finiteness of θ are checked before any link is applied.
    //
    // Given
    // -----
    // - A 3-vector against `expected = 4`, and a 4-vector holding `∞`.
    //
    // Expect
    // ------
    // - `CoefficientLengthMismatch` then `NonFiniteCoefficient { index: 2 }`.
    fn validate_coefficients_reports_problems() {
        assert_eq!(
            validate_coefficients(array![0.0, 0.0, 0.0].view(), 4),
            Err(SurvivalError::CoefficientLengthMismatch { expected: 4, found: 3 })
        );
        assert!(matches!(
            validate_coefficients(array![0.0, 0.0, f64::INFINITY, 0.0].view(), 4),
            Err(SurvivalError::NonFiniteCoefficient { index: 2, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // The link sums intercept and category offset in log space.
    //
    // Given
    // -----
    // - Two categories, `θ = (ln 2, ln 3, ln 5, ln 0.5)`.
    //
    // Expect
    // ------
    // - Reference: `α = 2`, `β = 5`. Other: `α = 6`, `β = 2.5`.
    fn link_combines_intercept_and_offset() {
        // Arrange
        let map = IndicatorMap::build(["a", "b"]);
        let theta = array![2.0_f64.ln(), 3.0_f64.ln(), 5.0_f64.ln(), 0.5_f64.ln()];

        // Act
        let fitted = FittedParameters::from_theta(theta, &map).expect("finite link");

        // Assert
        let a = fitted.get(&"a").expect("a fitted");
        let b = fitted.get(&"b").expect("b fitted");
        assert!((a.alpha - 2.0).abs() < 1e-12 && (a.beta - 5.0).abs() < 1e-12);
        assert!((b.alpha - 6.0).abs() < 1e-12 && (b.beta - 2.5).abs() < 1e-12);
        assert!((a.period_one_churn() - 2.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // An overflowing link is a shape error, not an infinite parameter.
    //
    // Given
    // -----
    // - One category with an alpha coefficient of `1000`.
    //
    // Expect
    // ------
    // - `InvalidShape`.
    fn overflowing_link_is_rejected() {
        let map = IndicatorMap::build([1_u32]);

        let err = FittedParameters::from_theta(array![1000.0, 0.0], &map)
            .expect_err("exp(1000) overflows");

        assert!(matches!(err, SurvivalError::InvalidShape { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Layout metadata mirrors the indicator map.
    //
    // Given
    // -----
    // - Categories `{x, y}`.
    //
    // Expect
    // ------
    // - `n_categories = 2`, sorted categories, indicator rows as booleans.
    fn model_params_mirror_indicator_map() {
        let params = ModelParams::from_indicators(&IndicatorMap::build(["y", "x"]));

        assert_eq!(params.n_categories, 2);
        assert_eq!(params.categories, vec!["x", "y"]);
        assert_eq!(params.indicators.get("y"), Some(&vec![true, true]));
        assert_eq!(params.indicators.get("x"), Some(&vec![true, false]));
    }
}
