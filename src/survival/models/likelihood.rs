//! sBG cohort log-likelihood and its gradient in coefficient space.
//!
//! Purpose
//! -------
//! Evaluate the grouped-data log-likelihood of a [`Dataset`] at a coefficient
//! vector `θ`, and expose it to the optimizer through [`LogLikelihood`].
//!
//! Key behaviors
//! -------------
//! - Each category's `(ln α, ln β)` comes from `θ` through its indicator
//!   vector. The log-scale recursion runs once per category, at the longest
//!   horizon among its cohorts, and every cohort reads only the prefix it
//!   observed.
//! - A cohort observed for `len` periods contributes
//!   `Σ_{t=1}^{len−1} lost[t] · ln P[t] + active[len−1] · ln S[len−1]`.
//!   Zero counts contribute exactly 0, whatever the probability.
//! - The analytic gradient chains the recursion sensitivities through the
//!   link: `∂ℓ/∂θ_α[j] = Σ_c 1{j selected by c} · ∂ℓ_c/∂ln α_c`, and
//!   likewise for `β`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Cohorts are validated on construction, so every horizon is at least 2
//!   and never exceeds the stored counts.
//! - Working in `ln α`, `ln β` keeps `ℓ` and `∇ℓ` finite for every finite
//!   θ, including points where `exp` of a coefficient sum would overflow.
//!   Line searches can therefore try far-away points and back off.
//! - A non-finite total can only come from coefficient sums that overflow
//!   `f64`; it is reported as `NonFiniteLogLik`.
//!
//! Conventions
//! -----------
//! - [`ShiftedBetaLikelihood::log_likelihood`] and
//!   [`ShiftedBetaLikelihood::negative_log_likelihood`] work on the total.
//! - The [`LogLikelihood`] impl hands the optimizer the *per-customer
//!   average* `ℓ(θ) / N`, where `N` is the number of acquired customers.
//!   The maximizer is unchanged, and the gradient tolerance becomes
//!   independent of the dataset size.
use ndarray::{Array1, ArrayView1};

use crate::{
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Grad, LogLikelihood, Theta},
        numerical_stability::weighted_log,
    },
    survival::{
        core::{
            cohort::{Category, CohortSeries, Dataset},
            indicator::{IndicatorMap, IndicatorVector},
            params::{log_shapes, validate_coefficients},
            retention::{LogRetention, log_retention},
        },
        errors::{SurvivalError, SurvivalResult},
    },
};

/// Log-likelihood of the sBG model over a fixed category layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftedBetaLikelihood<C: Category> {
    indicators: IndicatorMap<C>,
    analytic_grad: bool,
}

impl<C: Category> ShiftedBetaLikelihood<C> {
    pub fn new(indicators: IndicatorMap<C>) -> Self {
        Self { indicators, analytic_grad: true }
    }

    /// Same likelihood, but the optimizer falls back to finite differences.
    pub fn with_finite_differences(mut self) -> Self {
        self.analytic_grad = false;
        self
    }

    pub fn indicators(&self) -> &IndicatorMap<C> {
        &self.indicators
    }

    /// Total log-likelihood `ℓ(θ)`.
    ///
    /// # Errors
    /// - Coefficient validation errors and `UnknownCategory`.
    /// - `InvalidShape` if a coefficient sum overflows.
    /// - `NonFiniteLogLik` if the sum is NaN or infinite.
    pub fn log_likelihood(&self, theta: ArrayView1<'_, f64>, data: &Dataset<C>) -> SurvivalResult<f64> {
        validate_coefficients(theta, self.indicators.n_coefficients())?;
        let mut total = 0.0;
        for (category, cohorts) in data.iter() {
            let (log_alpha, log_beta) = log_shapes(theta, self.indicator_for(category)?)?;
            let logs = log_retention(log_alpha, log_beta, max_horizon(cohorts))?;
            total += cohorts.iter().map(|c| cohort_log_likelihood(&logs, c)).sum::<f64>();
        }
        if !total.is_finite() {
            return Err(SurvivalError::NonFiniteLogLik { value: total });
        }
        Ok(total)
    }

    /// `−ℓ(θ)`, the quantity the fitter minimizes.
    pub fn negative_log_likelihood(
        &self, theta: ArrayView1<'_, f64>, data: &Dataset<C>,
    ) -> SurvivalResult<f64> {
        Ok(-self.log_likelihood(theta, data)?)
    }

    /// Analytic gradient `∇ℓ(θ)` of the total log-likelihood.
    ///
    /// # Errors
    /// Same as [`ShiftedBetaLikelihood::log_likelihood`]; a non-finite
    /// gradient entry is reported as `NonFiniteLogLik`.
    pub fn log_likelihood_grad(
        &self, theta: ArrayView1<'_, f64>, data: &Dataset<C>,
    ) -> SurvivalResult<Array1<f64>> {
        validate_coefficients(theta, self.indicators.n_coefficients())?;
        let n = self.indicators.n_categories();
        let mut grad = Array1::<f64>::zeros(2 * n);
        for (category, cohorts) in data.iter() {
            let indicator = self.indicator_for(category)?;
            let (log_alpha, log_beta) = log_shapes(theta, indicator)?;
            let logs = log_retention(log_alpha, log_beta, max_horizon(cohorts))?;
            let (mut d_alpha, mut d_beta) = (0.0, 0.0);
            for cohort in cohorts {
                let (da, db) = cohort_score(&logs, cohort);
                d_alpha += da;
                d_beta += db;
            }
            // ∂ln α/∂θ_α[j] = 1 for every selected j; same for β.
            for j in indicator.selected() {
                grad[j] += d_alpha;
                grad[n + j] += d_beta;
            }
        }
        if let Some(&value) = grad.iter().find(|g| !g.is_finite()) {
            return Err(SurvivalError::NonFiniteLogLik { value });
        }
        Ok(grad)
    }

    /// Check that `θ` and `data` match this layout.
    ///
    /// # Errors
    /// - Coefficient validation errors.
    /// - `CategorySetMismatch` / `UnknownCategory` from the indicator map.
    pub fn check_inputs(&self, theta: ArrayView1<'_, f64>, data: &Dataset<C>) -> SurvivalResult<()> {
        validate_coefficients(theta, self.indicators.n_coefficients())?;
        self.indicators.ensure_covers(data)
    }

    // ---- Helper methods ----

    fn indicator_for(&self, category: &C) -> SurvivalResult<&IndicatorVector> {
        self.indicators
            .get(category)
            .ok_or_else(|| SurvivalError::UnknownCategory { category: format!("{category:?}") })
    }
}

impl<C: Category> LogLikelihood for ShiftedBetaLikelihood<C> {
    type Data = Dataset<C>;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<f64> {
        Ok(self.log_likelihood(theta.view(), data)? / customer_scale(data))
    }

    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()> {
        Ok(self.check_inputs(theta.view(), data)?)
    }

    fn grad(&self, theta: &Theta, data: &Self::Data) -> OptResult<Grad> {
        if !self.analytic_grad {
            return Err(OptError::GradientNotImplemented);
        }
        Ok(self.log_likelihood_grad(theta.view(), data)? / customer_scale(data))
    }
}

/// Log-likelihood contribution of one cohort, reading only its horizon.
///
/// `logs` must cover at least `cohort.horizon()` periods.
pub fn cohort_log_likelihood(logs: &LogRetention, cohort: &CohortSeries) -> f64 {
    let len = cohort.horizon();
    let churned: f64 = cohort.lost()[1..]
        .iter()
        .zip(&logs.log_churn[1..len])
        .map(|(&lost, &lp)| weighted_log(lost, lp))
        .sum();
    churned + weighted_log(cohort.censored(), logs.log_survival[len - 1])
}

// ---- Helper functions ----

/// `(∂ℓ/∂ln α, ∂ℓ/∂ln β)` of one cohort's contribution.
fn cohort_score(logs: &LogRetention, cohort: &CohortSeries) -> (f64, f64) {
    let len = cohort.horizon();
    let lost = cohort.lost();
    let (mut d_alpha, mut d_beta) = (0.0, 0.0);
    for t in 1..len {
        let w = lost[t] as f64;
        d_alpha += w * logs.dlog_churn_alpha[t];
        d_beta += w * logs.dlog_churn_beta[t];
    }
    let censored = cohort.censored() as f64;
    d_alpha += censored * logs.dlog_survival_alpha[len - 1];
    d_beta += censored * logs.dlog_survival_beta[len - 1];
    (d_alpha, d_beta)
}

fn max_horizon(cohorts: &[CohortSeries]) -> usize {
    cohorts.iter().map(CohortSeries::horizon).max().unwrap_or(0)
}

fn customer_scale(data: &Dataset<impl Category>) -> f64 {
    data.total_customers().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survival::core::retention::retention_stats;
    use ndarray::{array, s};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Agreement with a hand-computed likelihood.
    // - Horizon discipline for padded cohorts.
    // - The zero-count guard under probability underflow.
    // - Invariance under reparameterizations that keep every category's shapes.
    // - The analytic gradient against central differences.
    // -------------------------------------------------------------------------

    /// Coefficient vector reaching the same shapes with the reference category
    /// moved to `new_reference`. Used to check layout invariance.
    fn rebase_reference(theta: ArrayView1<'_, f64>, new_reference: usize) -> Array1<f64> {
        let n = theta.len() / 2;
        let mut out = theta.to_owned();
        for block in 0..2 {
            let b = theta.slice(s![block * n..(block + 1) * n]);
            let shift = b[new_reference];
            out[block * n] = b[0] + shift;
            for j in 1..n {
                out[block * n + j] = if j == new_reference { -shift } else { b[j] - shift };
            }
        }
        out
    }

    fn cohort(active: Vec<u64>, lost: Vec<u64>) -> CohortSeries {
        CohortSeries::new(active, lost).expect("valid cohort")
    }

    fn single(c: CohortSeries) -> (ShiftedBetaLikelihood<&'static str>, Dataset<&'static str>) {
        let ds = Dataset::from_cohorts([("only", c)]).expect("valid dataset");
        (ShiftedBetaLikelihood::new(IndicatorMap::from_dataset(&ds)), ds)
    }

    #[test]
    // Purpose
    // -------
    // The total matches the sBG formula evaluated by hand.
    //
    // Given
    // -----
    // - `α = 1`, `β = 3` (`P = [·, 0.25, 0.15]`, `S = [·, 0.75, 0.6]`),
    //   `active = [10, 7, 5]`, `lost = [0, 3, 2]`.
    //
    // Expect
    // ------
    // - `3 ln 0.25 + 2 ln 0.15 + 5 ln 0.6`.
    fn log_likelihood_matches_hand_computation() {
        // Arrange
        let (ll, ds) = single(cohort(vec![10, 7, 5], vec![0, 3, 2]));
        let theta = array![0.0, 3.0_f64.ln()];

        // Act
        let value = ll.log_likelihood(theta.view(), &ds).expect("finite likelihood");

        // Assert
        let expected = 3.0 * 0.25_f64.ln() + 2.0 * 0.15_f64.ln() + 5.0 * 0.6_f64.ln();
        assert!((value - expected).abs() < 1e-12);
        let nll = ll.negative_log_likelihood(theta.view(), &ds).expect("finite likelihood");
        assert_eq!(nll, -value);
    }

    #[test]
    // Purpose
    // -------
    // Padding past a cohort's horizon never reaches the likelihood.
    //
    // Given
    // -----
    // - The same three observed periods, once unpadded and once padded with
    //   arbitrary counts, next to a longer sibling cohort.
    //
    // Expect
    // ------
    // - Identical likelihoods.
    fn padded_storage_is_ignored() {
        // Arrange
        let long = cohort(vec![50, 40, 35, 31, 28], vec![0, 10, 5, 4, 3]);
        let plain = cohort(vec![10, 7, 5], vec![0, 3, 2]);
        let padded = CohortSeries::with_horizon(vec![10, 7, 5, 1, 0], vec![0, 3, 2, 4, 1], 3)
            .expect("valid padded cohort");
        let ds_plain = Dataset::from_cohorts([("c", long.clone()), ("c", plain)]).expect("dataset");
        let ds_padded = Dataset::from_cohorts([("c", long), ("c", padded)]).expect("dataset");
        let ll = ShiftedBetaLikelihood::new(IndicatorMap::build(["c"]));
        let theta = array![-0.4, 1.1];

        // Act
        let a = ll.log_likelihood(theta.view(), &ds_plain).expect("finite");
        let b = ll.log_likelihood(theta.view(), &ds_padded).expect("finite");

        // Assert
        assert_eq!(a, b);
    }

    #[test]
    // Purpose
    // -------
    // Zero counts on underflowed churn probabilities do not produce NaN.
    //
    // Given
    // -----
    // - `α = 5000`, `β = 0.001` over 400 periods, so `P[t]` underflows to 0
    //   late in the horizon; every customer churns in period 1.
    //
    // Expect
    // ------
    // - A finite log-likelihood equal to `100 · ln P[1]`.
    fn zero_counts_survive_underflow() {
        // Arrange
        let mut active = vec![0_u64; 400];
        active[0] = 100;
        let mut lost = vec![0_u64; 400];
        lost[1] = 100;
        let (ll, ds) = single(cohort(active, lost));
        let theta = array![5000.0_f64.ln(), 0.001_f64.ln()];
        let stats = retention_stats(5000.0, 0.001, 400).expect("valid shapes");
        assert_eq!(stats.churn[399], 0.0);

        // Act
        let value = ll.log_likelihood(theta.view(), &ds).expect("zero counts are guarded");

        // Assert
        assert!(value.is_finite());
        assert!((value - 100.0 * stats.churn[1].ln()).abs() < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Value and gradient stay finite far outside the range where `exp` of
    // the coefficients is representable, so line searches can evaluate there.
    //
    // Given
    // -----
    // - A cohort with churn in every period and survivors at the end.
    // - `θ ∈ {(800, −800), (−800, 800), (1e4, 1e4), (−1e4, 3)}`.
    //
    // Expect
    // ------
    // - Finite `ℓ(θ)` and `∇ℓ(θ)`, each far below `ℓ` at a moderate θ.
    fn likelihood_is_finite_at_extreme_coefficients() {
        // Arrange
        let (ll, ds) = single(cohort(vec![1000, 900, 820, 760], vec![0, 100, 80, 60]));
        let moderate = ll.log_likelihood(array![0.0, 1.0].view(), &ds).expect("finite");

        for theta in [
            array![800.0, -800.0],
            array![-800.0, 800.0],
            array![1e4, 1e4],
            array![-1e4, 3.0],
        ] {
            // Act
            let value = ll.log_likelihood(theta.view(), &ds).expect("finite at any finite θ");
            let grad = ll.log_likelihood_grad(theta.view(), &ds).expect("finite gradient");

            // Assert
            assert!(value.is_finite() && value < moderate, "θ = {theta}: ℓ = {value}");
            assert!(grad.iter().all(|g| g.is_finite()), "θ = {theta}: ∇ℓ = {grad}");
        }
    }

    #[test]
    // Purpose
    // -------
    // The likelihood depends on θ only through each category's shapes.
    //
    // Given
    // -----
    // - Two categories with different data, and `θ'` obtained by making the
    //   second category the reference: the intercept absorbs its offset and
    //   the offset flips sign. The data are swapped between labels to match.
    //
    // Expect
    // ------
    // - `ℓ_D(θ) = ℓ_{D'}(θ')`, and both equal the sum of per-category
    //   likelihoods at the implied shapes.
    fn likelihood_is_invariant_under_reference_change() {
        // Arrange
        let x = cohort(vec![1000, 900, 820, 760], vec![0, 100, 80, 60]);
        let y = cohort(vec![500, 420, 370], vec![0, 80, 50]);
        let ds = Dataset::from_cohorts([("a", x.clone()), ("b", y.clone())]).expect("dataset");
        let swapped = Dataset::from_cohorts([("a", y.clone()), ("b", x.clone())]).expect("dataset");
        let ll = ShiftedBetaLikelihood::new(IndicatorMap::build(["a", "b"]));
        let theta = array![0.3, -0.8, 1.2, 0.5];
        let theta_rebased = rebase_reference(theta.view(), 1);

        // Act
        let original = ll.log_likelihood(theta.view(), &ds).expect("finite");
        let rebased = ll.log_likelihood(theta_rebased.view(), &swapped).expect("finite");

        // Assert
        assert!((original - rebased).abs() < 1e-9);
        let by_hand = cohort_log_likelihood(&log_retention(0.3, 1.2, 4).expect("valid"), &x)
            + cohort_log_likelihood(&log_retention(-0.5, 1.7, 3).expect("valid"), &y);
        assert!((original - by_hand).abs() < 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // The analytic gradient matches central differences of the total.
    //
    // Given
    // -----
    // - Two categories, several cohorts of different horizons, a generic θ.
    //
    // Expect
    // ------
    // - Component-wise agreement within `1e-4 · max(1, |g|)`.
    fn analytic_gradient_matches_finite_differences() {
        // Arrange
        let ds = Dataset::from_cohorts([
            ("a", cohort(vec![1000, 900, 820, 760], vec![0, 100, 80, 60])),
            ("a", cohort(vec![300, 250, 225], vec![0, 50, 25])),
            ("b", cohort(vec![800, 600, 480, 400, 350], vec![0, 200, 120, 80, 50])),
        ])
        .expect("dataset");
        let ll = ShiftedBetaLikelihood::new(IndicatorMap::from_dataset(&ds));
        let theta = array![-0.2, 0.4, 0.9, -0.3];
        let h = 1e-6;

        // Act
        let grad = ll.log_likelihood_grad(theta.view(), &ds).expect("finite gradient");

        // Assert
        for j in 0..theta.len() {
            let mut up = theta.clone();
            let mut down = theta.clone();
            up[j] += h;
            down[j] -= h;
            let fd = (ll.log_likelihood(up.view(), &ds).expect("finite")
                - ll.log_likelihood(down.view(), &ds).expect("finite"))
                / (2.0 * h);
            assert!((grad[j] - fd).abs() < 1e-4 * fd.abs().max(1.0), "j={j}: {} vs {fd}", grad[j]);
        }
    }

    #[test]
    // Purpose
    // -------
    // The optimizer-facing surface scales by customers and validates inputs.
    //
    // Given
    // -----
    // - A single cohort of 10 customers; a wrong-length θ.
    //
    // Expect
    // ------
    // - `value = ℓ / 10`, `check` rejects the wrong length, and the
    //   finite-difference variant reports `GradientNotImplemented`.
    fn optimizer_surface_scales_and_checks() {
        // Arrange
        let (ll, ds) = single(cohort(vec![10, 7, 5], vec![0, 3, 2]));
        let theta = array![0.0, 3.0_f64.ln()];

        // Act
        let total = ll.log_likelihood(theta.view(), &ds).expect("finite");
        let avg = LogLikelihood::value(&ll, &theta, &ds).expect("finite");
        let bad = LogLikelihood::check(&ll, &array![0.0], &ds);
        let fd = ll.clone().with_finite_differences();

        // Assert
        assert!((avg - total / 10.0).abs() < 1e-15);
        assert!(bad.is_err());
        assert_eq!(
            LogLikelihood::grad(&fd, &theta, &ds),
            Err(OptError::GradientNotImplemented)
        );
    }
}
