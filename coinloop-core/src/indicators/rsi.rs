//! Relative Strength Index (RSI).
//!
//! Simple rolling means of gains and losses over `period` close-to-close
//! changes. RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period (the first change exists at index 1).
//! Edge cases: avg_loss == 0 → RSI = 100; both averages zero (flat window) → 50.

use crate::components::indicator::Indicator;
use crate::domain::Sample;

use super::sma_of_series;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, samples: &[Sample]) -> Vec<f64> {
        rsi(samples, self.period)
    }
}

/// RSI over close prices.
pub fn rsi(samples: &[Sample], period: usize) -> Vec<f64> {
    let n = samples.len();
    let mut gains = vec![f64::NAN; n];
    let mut losses = vec![f64::NAN; n];
    for i in 1..n {
        let change = samples[i].close - samples[i - 1].close;
        if change.is_nan() {
            continue;
        }
        gains[i] = change.max(0.0);
        losses[i] = (-change).max(0.0);
    }

    let avg_gain = sma_of_series(&gains, period);
    let avg_loss = sma_of_series(&losses, period);
    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&g, &l)| {
            if g.is_nan() || l.is_nan() {
                f64::NAN
            } else {
                rsi_from_averages(g, l)
            }
        })
        .collect()
}

/// RSI value from average gain and average loss.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 && avg_gain <= 0.0 {
        50.0
    } else if avg_loss <= 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
