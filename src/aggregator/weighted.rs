//! Weighted running means for percentage fields.
//!
//! A percentage change reported per chain is weighted by the absolute metric
//! it describes (a 24h change by the 24h total, and so on), so that merging
//! chains gives the same answer as recomputing the change from summed
//! totals. State lives in a [`WeightedStore`] that sits next to the record
//! being built and is consumed when the record is finalised.

use crate::parser::lenient::finite;
use crate::parser::schema::{EntitySummary, MetricField};
use std::collections::BTreeMap;

/// Running `Σ change·weight` and `Σ weight` for one field
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeightedAccumulator {
    pub numerator: f64,
    pub denominator: f64,
}

impl WeightedAccumulator {
    /// Fold one observation in.
    ///
    /// Returns false, leaving the accumulator untouched, when either input
    /// is absent or non-finite or the weight is not positive.
    pub fn observe(&mut self, weight: Option<f64>, change: Option<f64>) -> bool {
        let (Some(weight), Some(change)) = (weight.and_then(finite), change.and_then(finite)) else {
            return false;
        };
        if weight <= 0.0 {
            return false;
        }

        self.numerator += change * weight;
        self.denominator += weight;
        true
    }

    /// Weighted mean, `None` while no weight has been observed
    pub fn value(&self) -> Option<f64> {
        if self.denominator > 0.0 {
            finite(self.numerator / self.denominator)
        } else {
            None
        }
    }
}

/// Accumulators for one record, keyed by the field they resolve into
#[derive(Debug, Clone, Default)]
pub struct WeightedStore {
    accumulators: BTreeMap<MetricField, WeightedAccumulator>,
}

impl WeightedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an observation into `key`'s accumulator.
    ///
    /// Returns the updated mean, or `None` if the observation was rejected.
    /// A rejected observation does not create an accumulator.
    pub fn apply(&mut self, key: MetricField, weight: Option<f64>, change: Option<f64>) -> Option<f64> {
        let mut acc = self.accumulators.get(&key).copied().unwrap_or_default();
        if !acc.observe(weight, change) {
            return None;
        }
        self.accumulators.insert(key, acc);
        acc.value()
    }

    pub fn get(&self, key: MetricField) -> Option<&WeightedAccumulator> {
        self.accumulators.get(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.accumulators.is_empty()
    }

    /// Write every accumulated mean onto `target` and drop the state.
    ///
    /// Fields that never received an accepted observation keep whatever
    /// value `target` already carries.
    pub fn finalize_into(self, target: &mut EntitySummary) {
        for (key, acc) in self.accumulators {
            *target.slot(key) = acc.value();
        }
    }
}

/// Apply one weighted observation and republish the running mean onto `target`
///
/// **Public** - the per-observation step used while merging chains
///
/// A rejected observation is a no-op: `target` keeps its previous value.
pub fn apply_weighted_change(
    store: &mut WeightedStore,
    target: &mut EntitySummary,
    key: MetricField,
    weight: Option<f64>,
    change: Option<f64>,
) {
    if let Some(mean) = store.apply(key, weight, change) {
        *target.slot(key) = Some(mean);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_weight_is_ignored() {
        let mut store = WeightedStore::new();
        let mut target = EntitySummary::new("x");

        for (weight, change) in [(10.0, 5.0), (0.0, 999.0), (20.0, 10.0)] {
            apply_weighted_change(&mut store, &mut target, MetricField::Change1d, Some(weight), Some(change));
        }

        let expected = (5.0 * 10.0 + 10.0 * 20.0) / 30.0;
        assert!((target.change_1d.unwrap() - expected).abs() < 1e-12);
        assert_eq!(store.get(MetricField::Change1d).unwrap().denominator, 30.0);
    }

    #[test]
    fn test_rejected_observation_leaves_previous_value() {
        let mut store = WeightedStore::new();
        let mut target = EntitySummary::new("x");
        target.change_7d = Some(42.0);

        apply_weighted_change(&mut store, &mut target, MetricField::Change7d, None, Some(1.0));
        apply_weighted_change(&mut store, &mut target, MetricField::Change7d, Some(5.0), Some(f64::NAN));
        apply_weighted_change(&mut store, &mut target, MetricField::Change7d, Some(-5.0), Some(1.0));

        assert_eq!(target.change_7d, Some(42.0));
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_accumulator_has_no_value() {
        assert_eq!(WeightedAccumulator::default().value(), None);
    }

    #[test]
    fn test_finalize_writes_means() {
        let mut store = WeightedStore::new();
        store.apply(MetricField::FeesChange1d, Some(1.0), Some(4.0));
        store.apply(MetricField::FeesChange1d, Some(3.0), Some(8.0));

        let mut target = EntitySummary::new("x");
        store.finalize_into(&mut target);
        assert_eq!(target.fees_change_1d, Some(7.0));
    }
}
