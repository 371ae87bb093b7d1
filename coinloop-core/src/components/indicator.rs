//! Indicator trait and computed indicator values container.
//!
//! Indicators are pure functions: sample history in, numeric series out.
//! The output is aligned index-for-index with the input slice.

use crate::domain::Sample;
use std::collections::BTreeMap;

/// Trait for single-series indicators.
///
/// Multi-output indicators (MACD, Bollinger, Stochastic) are exposed as one
/// instance per output line, keeping this trait single-series.
///
/// # Warm-up
/// Values before the warm-up are `f64::NAN`, never zero. Undefined values
/// inside the series (e.g. a zero stochastic range) are NaN as well.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rsi_14", "bollinger_upper_20_2").
    fn name(&self) -> &str;

    /// Index of the first value that can be defined.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the whole sample slice.
    ///
    /// Returns a `Vec<f64>` of the same length as `samples`.
    fn compute(&self, samples: &[Sample]) -> Vec<f64>;

    /// Latest defined value, or `None` while warming up.
    fn latest(&self, samples: &[Sample]) -> Option<f64> {
        crate::indicators::last_defined(&self.compute(samples))
    }
}

/// Container for computed indicator series, keyed by indicator name.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: BTreeMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute every indicator over `samples` and collect the results.
    pub fn compute_all(samples: &[Sample], indicators: &[Box<dyn Indicator>]) -> Self {
        let mut values = Self::new();
        for indicator in indicators {
            values.insert(indicator.name(), indicator.compute(samples));
        }
        values
    }

    /// Insert a named indicator series.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Get the indicator value at a specific index.
    pub fn get(&self, name: &str, index: usize) -> Option<f64> {
        self.series.get(name).and_then(|v| v.get(index).copied())
    }

    /// Get the full series for a named indicator.
    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// Latest defined value of every series, in name order.
    pub fn latest(&self) -> BTreeMap<String, Option<f64>> {
        self.series
            .iter()
            .map(|(name, values)| {
                let last = values.last().copied().filter(|v| !v.is_nan());
                (name.clone(), last)
            })
            .collect()
    }

    /// Number of indicator series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_values_insert_and_get() {
        let mut iv = IndicatorValues::new();
        iv.insert(
            "sma_20",
            vec![f64::NAN; 19]
                .into_iter()
                .chain(vec![100.0, 101.0])
                .collect(),
        );
        assert!(iv.get("sma_20", 0).unwrap().is_nan());
        assert_eq!(iv.get("sma_20", 19), Some(100.0));
        assert_eq!(iv.get("sma_20", 20), Some(101.0));
        assert_eq!(iv.get("sma_20", 21), None);
    }

    #[test]
    fn indicator_values_missing_name() {
        let iv = IndicatorValues::new();
        assert_eq!(iv.get("nonexistent", 0), None);
    }

    #[test]
    fn latest_hides_undefined_tail() {
        let mut iv = IndicatorValues::new();
        iv.insert("a", vec![1.0, 2.0]);
        iv.insert("b", vec![1.0, f64::NAN]);
        let latest = iv.latest();
        assert_eq!(latest["a"], Some(2.0));
        assert_eq!(latest["b"], None);
        assert_eq!(iv.len(), 2);
    }
}
