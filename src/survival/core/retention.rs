//! Period churn and survival probabilities of the sBG model.
//!
//! Purpose
//! -------
//! Evaluate, for shape parameters `(α, β)`, the probability `P[t]` of
//! churning exactly in period `t` and the probability `S[t]` of still being
//! active after period `t`.
//!
//! Key behaviors
//! -------------
//! - [`retention_stats`] runs the forward recursion
//!   `P[1] = α / (α + β)`, `P[t] = (β + t − 2) / (α + β + t − 1) · P[t−1]`,
//!   `S[1] = 1 − P[1]`, `S[t] = S[t−1] − P[t]`.
//! - [`log_retention`] runs the same recursion on the log scale from
//!   `ln α`, `ln β`, and carries the partial derivatives with respect to
//!   both. The likelihood and its analytic gradient are built on it.
//! - [`churn_probability`] / [`survival_probability`] evaluate single
//!   periods directly from the Beta function:
//!   `P[t] = B(α + 1, β + t − 1) / B(α, β)`, `S[t] = B(α, β + t) / B(α, β)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Index 0 is kept so indices line up with periods. It holds the
//!   degenerate values `P[0] = 0`, `S[0] = 1` and is never read by the
//!   likelihood.
//! - `P[t]` may underflow to 0 for long horizons or extreme shapes. That is
//!   not an error here. [`log_retention`] stays finite for any finite
//!   `ln α`, `ln β`, so the likelihood never takes the logarithm of an
//!   underflowed probability.
use statrs::function::beta::ln_beta;

use crate::{
    optimization::numerical_stability::log_add_exp,
    survival::errors::{SurvivalError, SurvivalResult},
};

/// Shortest horizon on which churn is observable.
pub const MIN_HORIZON: usize = 2;

/// `P` and `S` sequences for one `(α, β)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionStats {
    pub churn: Vec<f64>,
    pub survival: Vec<f64>,
}

impl RetentionStats {
    pub fn num_periods(&self) -> usize {
        self.churn.len()
    }

    /// Conditional churn probability in period `t >= 1`: `P[t] / S[t−1]`.
    ///
    /// `None` outside `1..num_periods`, and where `S[t−1]` has reached 0 so
    /// the ratio is undefined.
    pub fn hazard(&self, t: usize) -> Option<f64> {
        if t == 0 || t >= self.churn.len() {
            return None;
        }
        let at_risk = self.survival[t - 1];
        if at_risk <= 0.0 {
            return None;
        }
        Some(self.churn[t] / at_risk).filter(|h| h.is_finite())
    }
}

/// `ln P[t]`, `ln S[t]` and their derivatives with respect to `ln α` and
/// `ln β` (the `_alpha` / `_beta` vectors).
///
/// Entry 0 holds `ln P[0] = −∞`, `ln S[0] = 0` and zero derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRetention {
    pub log_churn: Vec<f64>,
    pub log_survival: Vec<f64>,
    pub dlog_churn_alpha: Vec<f64>,
    pub dlog_churn_beta: Vec<f64>,
    pub dlog_survival_alpha: Vec<f64>,
    pub dlog_survival_beta: Vec<f64>,
}

/// Churn and survival probabilities for periods `0..num_periods`.
///
/// # Errors
/// - `InvalidShape` if `alpha` or `beta` is not finite and positive.
/// - `HorizonTooShort` if `num_periods < 2`.
pub fn retention_stats(alpha: f64, beta: f64, num_periods: usize) -> SurvivalResult<RetentionStats> {
    validate(alpha, beta, num_periods)?;
    let mut churn = vec![0.0; num_periods];
    let mut survival = vec![1.0; num_periods];
    churn[1] = alpha / (alpha + beta);
    survival[1] = 1.0 - churn[1];
    for t in 2..num_periods {
        let tf = t as f64;
        churn[t] = (beta + tf - 2.0) / (alpha + beta + tf - 1.0) * churn[t - 1];
        survival[t] = survival[t - 1] - churn[t];
    }
    Ok(RetentionStats { churn, survival })
}

/// [`retention_stats`] on the log scale, with derivatives in `ln α`, `ln β`.
///
/// Runs the recursion in the rearranged form
/// `S[t] = S[t−1] · (β + t − 1) / (α + β + t − 1)` and
/// `P[t] = S[t−1] · α / (α + β + t − 1)`, which needs no subtraction of
/// probabilities. Sums of shapes are formed with `log_add_exp`, so every
/// entry is finite for finite inputs, even where `exp(ln α)` would overflow.
///
/// # Errors
/// - `InvalidShape` if `log_alpha` or `log_beta` is not finite.
/// - `HorizonTooShort` if `num_periods < 2`.
pub fn log_retention(
    log_alpha: f64, log_beta: f64, num_periods: usize,
) -> SurvivalResult<LogRetention> {
    if !log_alpha.is_finite() || !log_beta.is_finite() {
        return Err(SurvivalError::InvalidShape { alpha: log_alpha.exp(), beta: log_beta.exp() });
    }
    if num_periods < MIN_HORIZON {
        return Err(SurvivalError::HorizonTooShort { num_periods });
    }
    let mut out = LogRetention {
        log_churn: vec![f64::NEG_INFINITY; num_periods],
        log_survival: vec![0.0; num_periods],
        dlog_churn_alpha: vec![0.0; num_periods],
        dlog_churn_beta: vec![0.0; num_periods],
        dlog_survival_alpha: vec![0.0; num_periods],
        dlog_survival_beta: vec![0.0; num_periods],
    };

    let log_ab = log_add_exp(log_alpha, log_beta);
    for t in 1..num_periods {
        // ln(t − 1) is −∞ at t = 1; log_add_exp absorbs it.
        let log_k = ((t - 1) as f64).ln();
        let log_total = log_add_exp(log_ab, log_k);
        let log_beta_k = log_add_exp(log_beta, log_k);
        // α / (α + β + k), β / (α + β + k), β / (β + k)
        let share_alpha = (log_alpha - log_total).exp();
        let share_beta = (log_beta - log_total).exp();
        let share_beta_k = (log_beta - log_beta_k).exp();

        let (ls, dsa, dsb) =
            (out.log_survival[t - 1], out.dlog_survival_alpha[t - 1], out.dlog_survival_beta[t - 1]);
        out.log_churn[t] = ls + log_alpha - log_total;
        out.dlog_churn_alpha[t] = dsa + 1.0 - share_alpha;
        out.dlog_churn_beta[t] = dsb - share_beta;
        out.log_survival[t] = ls + log_beta_k - log_total;
        out.dlog_survival_alpha[t] = dsa - share_alpha;
        out.dlog_survival_beta[t] = dsb + share_beta_k - share_beta;
    }
    Ok(out)
}

/// `P[t]` for a single period `t >= 1`, from the Beta function.
///
/// # Errors
/// - `InvalidShape` for non-positive or non-finite shapes.
/// - `HorizonTooShort` when `t == 0`.
pub fn churn_probability(alpha: f64, beta: f64, t: usize) -> SurvivalResult<f64> {
    validate_shape(alpha, beta)?;
    if t == 0 {
        return Err(SurvivalError::HorizonTooShort { num_periods: t });
    }
    let tf = t as f64;
    Ok((ln_beta(alpha + 1.0, beta + tf - 1.0) - ln_beta(alpha, beta)).exp())
}

/// `S[t]` for a single period `t >= 0`, from the Beta function.
///
/// # Errors
/// - `InvalidShape` for non-positive or non-finite shapes.
pub fn survival_probability(alpha: f64, beta: f64, t: usize) -> SurvivalResult<f64> {
    validate_shape(alpha, beta)?;
    Ok((ln_beta(alpha, beta + t as f64) - ln_beta(alpha, beta)).exp())
}

// ---- Helper methods ----

fn validate_shape(alpha: f64, beta: f64) -> SurvivalResult<()> {
    let ok = |x: f64| x.is_finite() && x > 0.0;
    if !ok(alpha) || !ok(beta) {
        return Err(SurvivalError::InvalidShape { alpha, beta });
    }
    Ok(())
}

fn validate(alpha: f64, beta: f64, num_periods: usize) -> SurvivalResult<()> {
    validate_shape(alpha, beta)?;
    if num_periods < MIN_HORIZON {
        return Err(SurvivalError::HorizonTooShort { num_periods });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Probability axioms of the recursion on a grid of shapes.
    // - Agreement between the recursion and the Beta-function forms.
    // - The log-scale recursion against the linear one, its sensitivities
    //   against central differences, and its finiteness at extreme shapes.
    // - Hazards on exhausted curves.
    // - Input validation.
    // -------------------------------------------------------------------------

    const SHAPES: [(f64, f64); 5] = [(0.2, 0.2), (1.0, 1.0), (0.7, 3.5), (5.0, 0.4), (40.0, 90.0)];

    #[test]
    // Purpose
    // -------
    // `P` and `S` behave like probabilities for any positive shapes.
    //
    // Given
    // -----
    // - Several `(α, β)` pairs and a 30-period horizon.
    //
    // Expect
    // ------
    // - `P[t] >= 0`, `S[t] >= 0`, `S[t] = S[t−1] − P[t]`, `S` non-increasing,
    //   `Σ P[1..] <= 1`.
    fn recursion_satisfies_probability_axioms() {
        for (alpha, beta) in SHAPES {
            // Act
            let stats = retention_stats(alpha, beta, 30).expect("valid inputs");

            // Assert
            let mut mass = 0.0;
            for t in 1..30 {
                assert!(stats.churn[t] >= 0.0);
                assert!(stats.survival[t] >= -1e-12);
                assert!(stats.survival[t] <= stats.survival[t - 1] + 1e-15);
                assert!((stats.survival[t] - (stats.survival[t - 1] - stats.churn[t])).abs() < 1e-15);
                mass += stats.churn[t];
            }
            assert!(mass <= 1.0 + 1e-12, "({alpha}, {beta}): mass {mass}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Base case and the first recursive step match the closed form.
    //
    // Given
    // -----
    // - `α = 1`, `β = 3`, horizon 3.
    //
    // Expect
    // ------
    // - `P[1] = 1/4`, `P[2] = (3/5)·(1/4)`, `S[2] = 3/4 − 3/20`.
    fn recursion_base_case_and_first_step() {
        let stats = retention_stats(1.0, 3.0, 3).expect("valid inputs");

        assert_eq!(stats.churn[0], 0.0);
        assert_eq!(stats.survival[0], 1.0);
        assert!((stats.churn[1] - 0.25).abs() < 1e-15);
        assert!((stats.churn[2] - 0.15).abs() < 1e-15);
        assert!((stats.survival[2] - 0.6).abs() < 1e-15);
        assert!((stats.hazard(2).expect("in range") - 0.2).abs() < 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // The recursion agrees with the Beta-function expressions.
    //
    // Given
    // -----
    // - Several shapes, periods `1..20`.
    //
    // Expect
    // ------
    // - Relative differences below `1e-9`.
    fn recursion_matches_beta_function_form() {
        for (alpha, beta) in SHAPES {
            let stats = retention_stats(alpha, beta, 20).expect("valid inputs");
            for t in 1..20 {
                let p = churn_probability(alpha, beta, t).expect("valid inputs");
                let s = survival_probability(alpha, beta, t).expect("valid inputs");
                assert!((stats.churn[t] - p).abs() <= 1e-9 * p.max(1e-300));
                assert!((stats.survival[t] - s).abs() <= 1e-9 * s.max(1e-12) + 1e-14);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // The log-scale recursion reproduces the linear one.
    //
    // Given
    // -----
    // - Several shapes, horizon 25.
    //
    // Expect
    // ------
    // - `exp(ln P[t])` within `1e-12` relative of `P[t]`, and
    //   `exp(ln S[t])` within `1e-12` absolute of `S[t]`.
    fn log_recursion_matches_linear_recursion() {
        for (alpha, beta) in SHAPES {
            let stats = retention_stats(alpha, beta, 25).expect("valid inputs");
            let logs = log_retention(alpha.ln(), beta.ln(), 25).expect("valid inputs");

            assert_eq!(logs.log_churn[0], f64::NEG_INFINITY);
            assert_eq!(logs.log_survival[0], 0.0);
            for t in 1..25 {
                let p = logs.log_churn[t].exp();
                assert!((p - stats.churn[t]).abs() <= 1e-12 * stats.churn[t], "({alpha}, {beta}) t={t}");
                assert!((logs.log_survival[t].exp() - stats.survival[t]).abs() < 1e-12);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Log-scale sensitivities agree with central differences.
    //
    // Given
    // -----
    // - `ln α = ln 0.8`, `ln β = ln 2.5`, horizon 8, step `1e-6`.
    //
    // Expect
    // ------
    // - Agreement to `1e-6` for `ln P` and `ln S` in both directions.
    fn sensitivities_match_finite_differences() {
        // Arrange
        let (la, lb, n, h) = (0.8_f64.ln(), 2.5_f64.ln(), 8, 1e-6);
        let sens = log_retention(la, lb, n).expect("valid inputs");
        let at = |a: f64, b: f64| log_retention(a, b, n).expect("valid inputs");
        let (ap, am) = (at(la + h, lb), at(la - h, lb));
        let (bp, bm) = (at(la, lb + h), at(la, lb - h));

        // Act / Assert
        for t in 1..n {
            let fd = |up: &[f64], down: &[f64]| (up[t] - down[t]) / (2.0 * h);
            let fd_pa = fd(&ap.log_churn, &am.log_churn);
            let fd_pb = fd(&bp.log_churn, &bm.log_churn);
            let fd_sa = fd(&ap.log_survival, &am.log_survival);
            let fd_sb = fd(&bp.log_survival, &bm.log_survival);
            assert!((sens.dlog_churn_alpha[t] - fd_pa).abs() < 1e-6, "t={t}");
            assert!((sens.dlog_churn_beta[t] - fd_pb).abs() < 1e-6, "t={t}");
            assert!((sens.dlog_survival_alpha[t] - fd_sa).abs() < 1e-6, "t={t}");
            assert!((sens.dlog_survival_beta[t] - fd_sb).abs() < 1e-6, "t={t}");
        }
    }

    #[test]
    // Purpose
    // -------
    // The log-scale recursion stays finite where `exp(ln α)` overflows or
    // the linear probabilities underflow.
    //
    // Given
    // -----
    // - `(ln α, ln β) ∈ {(800, −800), (−800, 800), (900, 900)}`, horizon 50.
    //
    // Expect
    // ------
    // - Every value and derivative for `t >= 1` is finite, and `ln S` is
    //   non-increasing.
    fn log_recursion_is_finite_for_extreme_shapes() {
        for (la, lb) in [(800.0, -800.0), (-800.0, 800.0), (900.0, 900.0)] {
            let logs = log_retention(la, lb, 50).expect("finite inputs");
            for t in 1..50 {
                let values = [
                    logs.log_churn[t],
                    logs.log_survival[t],
                    logs.dlog_churn_alpha[t],
                    logs.dlog_churn_beta[t],
                    logs.dlog_survival_alpha[t],
                    logs.dlog_survival_beta[t],
                ];
                assert!(values.iter().all(|v| v.is_finite()), "({la}, {lb}) t={t}: {values:?}");
                assert!(logs.log_survival[t] <= logs.log_survival[t - 1]);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // The hazard is undefined once nobody is left at risk.
    //
    // Given
    // -----
    // - Hand-built stats with `S[1] = 0`, and an ordinary recursion.
    //
    // Expect
    // ------
    // - `hazard(2) = None` for the exhausted curve; `hazard(0)` and an
    //   out-of-range period are `None`; ordinary hazards are `Some`.
    fn hazard_is_none_without_survivors() {
        let exhausted =
            RetentionStats { churn: vec![0.0, 1.0, 0.0], survival: vec![1.0, 0.0, 0.0] };
        let ordinary = retention_stats(1.0, 3.0, 3).expect("valid inputs");

        assert_eq!(exhausted.hazard(1), Some(1.0));
        assert_eq!(exhausted.hazard(2), None);
        assert_eq!(ordinary.hazard(0), None);
        assert_eq!(ordinary.hazard(3), None);
        assert!(ordinary.hazard(2).is_some());
    }

    #[test]
    // Purpose
    // -------
    // Invalid shapes and horizons are rejected; underflow is not.
    //
    // Given
    // -----
    // - `α = 0`, `β = NaN`, horizon 1, a non-finite `ln α`, and a long
    //   horizon with tiny `β`.
    //
    // Expect
    // ------
    // - `InvalidShape`, `HorizonTooShort`, and `Ok` with finite values.
    fn invalid_inputs_and_underflow() {
        assert!(matches!(retention_stats(0.0, 1.0, 5), Err(SurvivalError::InvalidShape { .. })));
        assert!(matches!(
            retention_stats(1.0, f64::NAN, 5),
            Err(SurvivalError::InvalidShape { .. })
        ));
        assert_eq!(
            retention_stats(1.0, 1.0, 1),
            Err(SurvivalError::HorizonTooShort { num_periods: 1 })
        );
        assert!(matches!(
            log_retention(f64::INFINITY, 0.0, 5),
            Err(SurvivalError::InvalidShape { .. })
        ));
        assert_eq!(
            log_retention(0.0, 0.0, 1),
            Err(SurvivalError::HorizonTooShort { num_periods: 1 })
        );
        let stats = retention_stats(500.0, 1e-3, 400).expect("underflow is not an error");
        assert!(stats.churn.iter().all(|p| p.is_finite() && *p >= 0.0));
    }
}
