//! Fit options — restart budget, seeding, initialization range, optimizer.
//!
//! [`FitOptions`] bundles everything the multi-start fitter needs beyond the
//! data: how many restarts to run, which seed drives the initial draws,
//! where those draws come from ([`InitRange`]), how each restart is optimized
//! ([`MLEOptions`]), and whether restarts run on the rayon pool.
//!
//! Defaults: 50 restarts, a fresh random seed, initial coefficients uniform
//! on `[-3, 1)`, L-BFGS with More–Thuente line search, `tol_grad = 1e-6`,
//! `max_iter = 300`, parallel restarts.
use ndarray::Array1;
use rand::{
    Rng,
    distributions::{Distribution, Uniform},
};

use crate::{
    optimization::loglik_optimizer::MLEOptions,
    survival::errors::{SurvivalError, SurvivalResult},
};

pub const DEFAULT_RESTARTS: usize = 50;
pub const DEFAULT_INIT_LOW: f64 = -3.0;
pub const DEFAULT_INIT_HIGH: f64 = 1.0;

/// Half-open interval `[low, high)` for initial coefficients.
///
/// Spans zero by default so initial `α`, `β` fall on both sides of 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitRange {
    low: f64,
    high: f64,
}

impl InitRange {
    /// # Errors
    /// - `InvalidInitRange` unless both bounds are finite, `low < high`, and
    ///   the width `high − low` is itself finite.
    pub fn new(low: f64, high: f64) -> SurvivalResult<Self> {
        if !low.is_finite() || !high.is_finite() || low >= high || !(high - low).is_finite() {
            return Err(SurvivalError::InvalidInitRange { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Draw `n` independent coefficients uniformly from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Array1<f64> {
        let dist = Uniform::new(self.low, self.high);
        Array1::from_iter((0..n).map(|_| dist.sample(rng)))
    }
}

impl Default for InitRange {
    fn default() -> Self {
        Self { low: DEFAULT_INIT_LOW, high: DEFAULT_INIT_HIGH }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub restarts: usize,
    pub seed: Option<u64>,
    pub init_range: InitRange,
    pub mle_opts: MLEOptions,
    pub parallel: bool,
}

impl FitOptions {
    /// # Errors
    /// - `InvalidRestarts` if `restarts == 0`.
    /// - `Optimizer(..)` if `mle_opts` fails [`MLEOptions::validate`].
    pub fn new(
        restarts: usize, seed: Option<u64>, init_range: InitRange, mle_opts: MLEOptions,
        parallel: bool,
    ) -> SurvivalResult<Self> {
        let opts = Self { restarts, seed, init_range, mle_opts, parallel };
        opts.validate()?;
        Ok(opts)
    }

    /// Default options with the given restart budget and seed.
    ///
    /// # Errors
    /// - `InvalidRestarts` if `restarts == 0`.
    pub fn with_restarts(restarts: usize, seed: Option<u64>) -> SurvivalResult<Self> {
        Self::new(restarts, seed, InitRange::default(), MLEOptions::default(), true)
    }

    /// Same options with a different per-restart iteration cap.
    ///
    /// # Errors
    /// - `Optimizer(InvalidMaxIter)` if `max_iter == 0`.
    pub fn with_max_iter(mut self, max_iter: usize) -> SurvivalResult<Self> {
        self.mle_opts = self.mle_opts.with_max_iter(max_iter)?;
        Ok(self)
    }

    /// Re-check the invariants of a value that may have been built by hand.
    ///
    /// # Errors
    /// - `InvalidRestarts` and `InvalidInitRange` as in the constructors.
    /// - `Optimizer(..)` of kind `ConfigurationError` for invalid tolerances,
    ///   iteration cap or L-BFGS memory in `mle_opts`.
    pub fn validate(&self) -> SurvivalResult<()> {
        if self.restarts == 0 {
            return Err(SurvivalError::InvalidRestarts { restarts: self.restarts });
        }
        InitRange::new(self.init_range.low, self.init_range.high)?;
        self.mle_opts.validate()?;
        Ok(())
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            restarts: DEFAULT_RESTARTS,
            seed: None,
            init_range: InitRange::default(),
            mle_opts: MLEOptions::default(),
            parallel: true,
        }
    }
}
