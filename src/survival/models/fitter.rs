//! Multi-start maximum-likelihood fitting for sBG models.
//!
//! Purpose
//! -------
//! Run an [`Optimizer`] from many random starting points, discard restarts
//! that did not converge to a usable optimum, and keep the one with the
//! smallest negative log-likelihood.
//!
//! Key behaviors
//! -------------
//! - Structural problems (invalid options, dataset categories not matching
//!   the indicator layout) are reported before any optimization starts.
//! - Starting points are drawn up front from one `StdRng` seeded with
//!   `FitOptions::seed` (or a freshly drawn seed, which is recorded), so the
//!   set of starts does not depend on thread scheduling.
//! - Restarts run on the rayon pool when `FitOptions::parallel` is set; the
//!   results are collected in restart order and reduced sequentially, so the
//!   outcome is identical to a sequential run.
//! - A restart is a candidate only if the optimizer reports convergence,
//!   the negative log-likelihood re-evaluated at its `θ̂` is finite, and
//!   `θ̂` maps to finite positive shapes. A strictly smaller objective wins;
//!   ties keep the earliest restart. Failed restarts never abort the others.
//! - Cancellation is cooperative: the flag is read before each restart
//!   begins, and restarts already running finish normally.
//!
//! Errors
//! ------
//! - `FittingFailure` when no restart is a candidate.
//! - `FitCancelled` when cancellation left no candidate.
use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::Array1;
use rand::{SeedableRng, rngs::StdRng};
use rayon::prelude::*;

use crate::{
    optimization::loglik_optimizer::{OptimOutcome, Optimizer},
    survival::{
        core::{
            cohort::{Category, Dataset},
            options::FitOptions,
            params::ShapeParams,
        },
        errors::{SurvivalError, SurvivalResult},
        models::likelihood::ShiftedBetaLikelihood,
    },
};

/// What happened to a single restart.
#[derive(Debug, Clone, PartialEq)]
pub enum RestartStatus {
    /// Converged with a finite objective (total negative log-likelihood).
    Candidate { objective: f64, iterations: usize },
    /// Did not produce a usable optimum.
    Failed { reason: String },
    /// Not started because the fit was cancelled.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestartSummary {
    pub index: usize,
    pub status: RestartStatus,
}

/// Winning restart of a multi-start fit plus per-restart diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// Coefficient vector of the winning restart.
    pub theta_hat: Array1<f64>,
    /// Total negative log-likelihood at `theta_hat`.
    pub objective: f64,
    pub best_restart: usize,
    /// Seed that generated the starting points.
    pub seed: u64,
    /// Raw optimizer report of the winning restart.
    pub optim: OptimOutcome,
    pub restarts: Vec<RestartSummary>,
}

impl FitOutcome {
    pub fn n_candidates(&self) -> usize {
        self.restarts
            .iter()
            .filter(|r| matches!(r.status, RestartStatus::Candidate { .. }))
            .count()
    }
}

/// Fit `likelihood` to `data` with `opts.restarts` random starts.
///
/// # Errors
/// - `InvalidRestarts` / `InvalidInitRange` for invalid options.
/// - `CategorySetMismatch` / `UnknownCategory` if `data` does not match the
///   likelihood's indicator layout.
/// - `FittingFailure` or `FitCancelled` when no restart is usable.
pub fn fit<C, O>(
    likelihood: &ShiftedBetaLikelihood<C>, data: &Dataset<C>, optimizer: &O, opts: &FitOptions,
    cancel: Option<&AtomicBool>,
) -> SurvivalResult<FitOutcome>
where
    C: Category,
    O: Optimizer,
{
    opts.validate()?;
    likelihood.indicators().ensure_covers(data)?;

    let seed = opts.seed.unwrap_or_else(rand::random::<u64>);
    let dim = likelihood.indicators().n_coefficients();
    let mut rng = StdRng::seed_from_u64(seed);
    let starts: Vec<Array1<f64>> =
        (0..opts.restarts).map(|_| opts.init_range.sample(&mut rng, dim)).collect();
    log::debug!(
        "sBG fit: {} restarts over {} coefficients, seed {seed}, parallel = {}",
        opts.restarts,
        dim,
        opts.parallel
    );

    let run = |(index, theta0): (usize, Array1<f64>)| {
        run_restart(likelihood, data, optimizer, index, theta0, cancel)
    };
    let runs: Vec<RestartRun> = if opts.parallel {
        starts.into_par_iter().enumerate().map(run).collect()
    } else {
        starts.into_iter().enumerate().map(run).collect()
    };

    select_best(runs, seed)
}

// ---- Helper types and functions ----

struct RestartRun {
    summary: RestartSummary,
    best: Option<(f64, OptimOutcome)>,
}

fn run_restart<C: Category, O: Optimizer>(
    likelihood: &ShiftedBetaLikelihood<C>, data: &Dataset<C>, optimizer: &O, index: usize,
    theta0: Array1<f64>, cancel: Option<&AtomicBool>,
) -> RestartRun {
    let failed = |reason: String| {
        log::warn!("sBG restart {index} discarded: {reason}");
        RestartRun {
            summary: RestartSummary { index, status: RestartStatus::Failed { reason } },
            best: None,
        }
    };

    if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
        return RestartRun {
            summary: RestartSummary { index, status: RestartStatus::Skipped },
            best: None,
        };
    }

    let outcome = match optimizer.maximize(likelihood, theta0, data) {
        Ok(outcome) => outcome,
        Err(err) => return failed(err.to_string()),
    };
    if !outcome.converged {
        return failed(format!("optimizer did not converge ({})", outcome.status));
    }
    let objective = match likelihood.negative_log_likelihood(outcome.theta_hat.view(), data) {
        Ok(objective) => objective,
        Err(err) => return failed(err.to_string()),
    };
    // The log-scale likelihood is finite beyond the range of `exp`; the
    // accepted point must still map to representable shapes.
    let representable = likelihood.indicators().iter().try_for_each(|(_, indicator)| {
        ShapeParams::from_coefficients(outcome.theta_hat.view(), indicator).map(|_| ())
    });
    if let Err(err) = representable {
        return failed(err.to_string());
    }

    log::trace!("sBG restart {index}: objective {objective} after {} iterations", outcome.iterations);
    RestartRun {
        summary: RestartSummary {
            index,
            status: RestartStatus::Candidate { objective, iterations: outcome.iterations },
        },
        best: Some((objective, outcome)),
    }
}

fn select_best(runs: Vec<RestartRun>, seed: u64) -> SurvivalResult<FitOutcome> {
    let total = runs.len();
    let mut summaries = Vec::with_capacity(total);
    let mut winner: Option<(usize, f64, OptimOutcome)> = None;
    let mut last_status = String::from("no restart completed");
    let (mut failed, mut skipped) = (0, 0);

    for run in runs {
        match &run.summary.status {
            RestartStatus::Failed { reason } => {
                failed += 1;
                last_status = reason.clone();
            }
            RestartStatus::Skipped => skipped += 1,
            RestartStatus::Candidate { .. } => {}
        }
        if let Some((objective, outcome)) = run.best {
            let better = winner.as_ref().map_or(true, |(_, best, _)| objective < *best);
            if better {
                winner = Some((run.summary.index, objective, outcome));
            }
        }
        summaries.push(run.summary);
    }

    let Some((best_restart, objective, optim)) = winner else {
        if skipped > 0 {
            log::warn!("sBG fit cancelled after {} of {total} restarts", total - skipped);
            return Err(SurvivalError::FitCancelled { completed: total - skipped });
        }
        return Err(SurvivalError::FittingFailure { restarts: total, failed, last_status });
    };
    if skipped > 0 {
        log::warn!("sBG fit cancelled; {skipped} of {total} restarts skipped");
    }
    log::info!(
        "sBG fit: restart {best_restart} wins with objective {objective} ({} of {total} candidates)",
        total - failed - skipped
    );
    Ok(FitOutcome {
        theta_hat: optim.theta_hat.clone(),
        objective,
        best_restart,
        seed,
        optim,
        restarts: summaries,
    })
}
