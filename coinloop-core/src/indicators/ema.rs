//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (span + 1).
//! Seed: EMA at the first value equals that value (no SMA seed).
//! Lookback: span - 1. Values before it are computed but reported as NaN.

use crate::components::indicator::Indicator;
use crate::domain::Sample;

use super::{closes, mask_warmup};

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("ema_{span}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.span.saturating_sub(1)
    }

    fn compute(&self, samples: &[Sample]) -> Vec<f64> {
        mask_warmup(ema_of_series(&closes(samples), self.span), self.lookback())
    }
}

/// Smoothing factor for a span.
pub fn alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Raw EMA of an arbitrary series, seeded by its first defined value.
///
/// Leading NaN values are skipped; the seed is the first non-NaN value and is
/// emitted at its own index. A NaN after the seed taints the rest.
pub fn ema_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if span == 0 {
        return result;
    }

    let Some(seed_index) = values.iter().position(|v| !v.is_nan()) else {
        return result;
    };

    let a = alpha(span);
    let mut prev = values[seed_index];
    result[seed_index] = prev;

    for i in (seed_index + 1)..n {
        if values[i].is_nan() {
            return result;
        }
        let ema = a * values[i] + (1.0 - a) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}
