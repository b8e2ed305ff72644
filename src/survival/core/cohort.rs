//! Cohort data containers for sBG retention models.
//!
//! Purpose
//! -------
//! Provide validated containers for grouped cohort counts: one
//! [`CohortSeries`] per acquisition cohort, grouped by category into a
//! [`Dataset`]. All structural checks happen here so the likelihood can read
//! counts without re-validating them.
//!
//! Key behaviors
//! -------------
//! - [`CohortSeries::with_horizon`] accepts padded storage and records the
//!   true observed horizon; accessors only ever expose the first `len`
//!   periods.
//! - [`Dataset`] keeps categories in a `BTreeMap`, which fixes the canonical
//!   category order used for the coefficient layout.
//!
//! Invariants & assumptions
//! ------------------------
//! - `active.len() == lost.len() >= len >= 2`.
//! - `active[0..len]` is non-increasing.
//! - `lost[0]` is stored but never read; churn is unobservable at period 0.
//! - Every category in a [`Dataset`] holds at least one cohort.
//!
//! Conventions
//! -----------
//! - Index `t` is the period since acquisition. `active[t]` counts customers
//!   still active at `t`; `lost[t]` counts customers who churned between
//!   `t - 1` and `t`.
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::survival::{
    core::retention::MIN_HORIZON,
    errors::{SurvivalError, SurvivalResult},
};

/// Label of a covariate level. Any ordered, cloneable, thread-safe type
/// qualifies; the ordering fixes the coefficient layout.
pub trait Category: Ord + Clone + Debug + Send + Sync + 'static {}

impl<T> Category for T where T: Ord + Clone + Debug + Send + Sync + 'static {}

/// Active/lost counts of one cohort, indexed by period since acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortSeries {
    active: Vec<u64>,
    lost: Vec<u64>,
    len: usize,
}

impl CohortSeries {
    /// Cohort whose horizon is the full length of the stored counts.
    ///
    /// # Errors
    /// See [`CohortSeries::with_horizon`].
    pub fn new(active: Vec<u64>, lost: Vec<u64>) -> SurvivalResult<Self> {
        let len = active.len();
        Self::with_horizon(active, lost, len)
    }

    /// Cohort observed for `len` periods; storage beyond `len` is padding.
    ///
    /// # Errors
    /// - `CountLengthMismatch` if `active` and `lost` differ in length.
    /// - `HorizonExceedsStorage` if `len` exceeds the stored periods.
    /// - `CohortTooShort` if `len < 2`.
    /// - `ActiveCountIncreased` at the first period where `active` grows.
    pub fn with_horizon(active: Vec<u64>, lost: Vec<u64>, len: usize) -> SurvivalResult<Self> {
        if active.len() != lost.len() {
            return Err(SurvivalError::CountLengthMismatch {
                active: active.len(),
                lost: lost.len(),
            });
        }
        if len > active.len() {
            return Err(SurvivalError::HorizonExceedsStorage { len, storage: active.len() });
        }
        if len < MIN_HORIZON {
            return Err(SurvivalError::CohortTooShort { len });
        }
        if let Some(period) = (1..len).find(|&t| active[t] > active[t - 1]) {
            return Err(SurvivalError::ActiveCountIncreased {
                period,
                previous: active[period - 1],
                current: active[period],
            });
        }
        Ok(Self { active, lost, len })
    }

    /// Observed horizon (number of periods including period 0).
    pub fn horizon(&self) -> usize {
        self.len
    }

    /// Active counts within the horizon.
    pub fn active(&self) -> &[u64] {
        &self.active[..self.len]
    }

    /// Lost counts within the horizon (`lost()[0]` is ignored downstream).
    pub fn lost(&self) -> &[u64] {
        &self.lost[..self.len]
    }

    /// Cohort size at acquisition.
    pub fn initial_size(&self) -> u64 {
        self.active[0]
    }

    /// Customers still active in the last observed period (right-censored).
    pub fn censored(&self) -> u64 {
        self.active[self.len - 1]
    }

    /// Number of stored periods, including padding.
    pub fn storage_len(&self) -> usize {
        self.active.len()
    }
}

/// Cohorts grouped by category, in canonical category order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<C: Category> {
    cohorts: BTreeMap<C, Vec<CohortSeries>>,
}

impl<C: Category> Dataset<C> {
    /// # Errors
    /// - `EmptyDataset` if `cohorts` is empty.
    /// - `NoCohorts` for the first category mapped to an empty list.
    pub fn new(cohorts: BTreeMap<C, Vec<CohortSeries>>) -> SurvivalResult<Self> {
        if cohorts.is_empty() {
            return Err(SurvivalError::EmptyDataset);
        }
        if let Some((category, _)) = cohorts.iter().find(|(_, list)| list.is_empty()) {
            return Err(SurvivalError::NoCohorts { category: format!("{category:?}") });
        }
        Ok(Self { cohorts })
    }

    /// Group `(category, cohort)` pairs; cohorts keep their input order
    /// within a category.
    ///
    /// # Errors
    /// - `EmptyDataset` if the iterator yields nothing.
    pub fn from_cohorts<I>(pairs: I) -> SurvivalResult<Self>
    where
        I: IntoIterator<Item = (C, CohortSeries)>,
    {
        let mut cohorts: BTreeMap<C, Vec<CohortSeries>> = BTreeMap::new();
        for (category, series) in pairs {
            cohorts.entry(category).or_default().push(series);
        }
        Self::new(cohorts)
    }

    pub fn n_categories(&self) -> usize {
        self.cohorts.len()
    }

    /// Categories in canonical (sorted) order.
    pub fn categories(&self) -> impl Iterator<Item = &C> {
        self.cohorts.keys()
    }

    pub fn cohorts(&self, category: &C) -> Option<&[CohortSeries]> {
        self.cohorts.get(category).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&C, &[CohortSeries])> {
        self.cohorts.iter().map(|(c, list)| (c, list.as_slice()))
    }

    /// Sum of initial cohort sizes over all categories.
    pub fn total_customers(&self) -> u64 {
        self.cohorts.values().flatten().map(CohortSeries::initial_size).sum()
    }
}
