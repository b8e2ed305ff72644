//! Indicator vectors mapping categories onto the shared coefficient space.
//!
//! The coefficient vector holds one alpha block and one beta block, each of
//! length `n_categories`. Block entry 0 is the global intercept and entry `i`
//! is the offset of the category at canonical index `i`. A category's
//! log-alpha is the sum of the block entries its [`IndicatorVector`]
//! selects (the intercept, plus its own offset unless it is the reference
//! category at index 0); log-beta works the same way.
//!
//! [`IndicatorMap`] is built once from the category set and never mutated.
use std::collections::{BTreeMap, BTreeSet};

use ndarray::ArrayView1;

use crate::survival::{
    core::cohort::{Category, Dataset},
    errors::{SurvivalError, SurvivalResult},
};

/// Boolean selection over one coefficient block.
///
/// Invariant: entry 0 is always selected, and at most one other entry is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorVector {
    mask: Vec<bool>,
}

impl IndicatorVector {
    fn for_index(index: usize, n_categories: usize) -> Self {
        let mut mask = vec![false; n_categories];
        mask[0] = true;
        mask[index] = true;
        Self { mask }
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.mask
    }

    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    /// Indices of the selected entries, ascending.
    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.mask.iter().enumerate().filter_map(|(i, &on)| on.then_some(i))
    }

    /// Sum of the selected entries of one coefficient block.
    ///
    /// `block.len()` must equal `self.len()`; callers validate the full
    /// coefficient vector before splitting it.
    pub fn combine(&self, block: ArrayView1<'_, f64>) -> f64 {
        self.selected().map(|i| block[i]).sum()
    }
}

/// Immutable lookup from category to [`IndicatorVector`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorMap<C: Category> {
    order: Vec<C>,
    vectors: BTreeMap<C, IndicatorVector>,
}

impl<C: Category> IndicatorMap<C> {
    /// Build indicator vectors for `categories`, sorted and de-duplicated
    /// into canonical order.
    pub fn build<I>(categories: I) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        let order: Vec<C> = categories.into_iter().collect::<BTreeSet<C>>().into_iter().collect();
        let n = order.len();
        let vectors = order
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), IndicatorVector::for_index(i, n)))
            .collect();
        Self { order, vectors }
    }

    /// Indicator map over the categories of `dataset`.
    pub fn from_dataset(dataset: &Dataset<C>) -> Self {
        Self::build(dataset.categories().cloned())
    }

    pub fn get(&self, category: &C) -> Option<&IndicatorVector> {
        self.vectors.get(category)
    }

    /// Canonical index of `category`.
    pub fn index_of(&self, category: &C) -> Option<usize> {
        self.order.binary_search(category).ok()
    }

    pub fn n_categories(&self) -> usize {
        self.order.len()
    }

    /// Length of the coefficient vector this map indexes (`2 · n_categories`).
    pub fn n_coefficients(&self) -> usize {
        2 * self.order.len()
    }

    /// Categories in canonical order.
    pub fn categories(&self) -> &[C] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&C, &IndicatorVector)> {
        self.vectors.iter()
    }

    /// Check that `dataset` uses exactly the categories of this map.
    ///
    /// # Errors
    /// - `CategorySetMismatch` if the category counts differ.
    /// - `UnknownCategory` for the first dataset category not in the map.
    pub fn ensure_covers(&self, dataset: &Dataset<C>) -> SurvivalResult<()> {
        if dataset.n_categories() != self.n_categories() {
            return Err(SurvivalError::CategorySetMismatch {
                expected: self.n_categories(),
                found: dataset.n_categories(),
            });
        }
        if let Some(unknown) = dataset.categories().find(|c| !self.vectors.contains_key(*c)) {
            return Err(SurvivalError::UnknownCategory { category: format!("{unknown:?}") });
        }
        Ok(())
    }
}
