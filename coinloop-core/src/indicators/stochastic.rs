//! Stochastic oscillator (%K / %D).
//!
//! %K = 100 * (close - lowest_low(k)) / (highest_high(k) - lowest_low(k))
//! %D = SMA(%K, d)
//!
//! A zero high-low range leaves %K undefined (NaN) for that sample, and any
//! %D window containing it is undefined as well.
//! Lookback: %K = k - 1, %D = k + d - 2.

use crate::components::indicator::Indicator;
use crate::domain::Sample;

use super::sma_of_series;

/// Which stochastic output to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochasticLine {
    K,
    D,
}

/// %K and %D, aligned with the input samples.
#[derive(Debug, Clone)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

/// %K from a close and the window's extremes. `None` when the range is zero.
pub fn percent_k(close: f64, lowest: f64, highest: f64) -> Option<f64> {
    let range = highest - lowest;
    if range > 0.0 {
        Some(100.0 * (close - lowest) / range)
    } else {
        None
    }
}

pub fn stochastic(samples: &[Sample], k_period: usize, d_period: usize) -> StochasticSeries {
    let n = samples.len();
    let mut k = vec![f64::NAN; n];

    if k_period >= 1 && n >= k_period {
        for i in (k_period - 1)..n {
            let window = &samples[i + 1 - k_period..=i];
            let lowest = window.iter().map(|s| s.low).fold(f64::INFINITY, f64::min);
            let highest = window
                .iter()
                .map(|s| s.high)
                .fold(f64::NEG_INFINITY, f64::max);
            if let Some(value) = percent_k(samples[i].close, lowest, highest) {
                k[i] = value;
            }
        }
    }

    let d = sma_of_series(&k, d_period);
    StochasticSeries { k, d }
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
    line: StochasticLine,
    name: String,
}

impl Stochastic {
    fn build(k_period: usize, d_period: usize, line: StochasticLine, label: &str) -> Self {
        assert!(k_period >= 1 && d_period >= 1, "stochastic periods must be >= 1");
        Self {
            k_period,
            d_period,
            line,
            name: format!("stoch_{label}_{k_period}_{d_period}"),
        }
    }

    pub fn k(k_period: usize, d_period: usize) -> Self {
        Self::build(k_period, d_period, StochasticLine::K, "k")
    }

    pub fn d(k_period: usize, d_period: usize) -> Self {
        Self::build(k_period, d_period, StochasticLine::D, "d")
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            StochasticLine::K => self.k_period - 1,
            StochasticLine::D => self.k_period + self.d_period - 2,
        }
    }

    fn compute(&self, samples: &[Sample]) -> Vec<f64> {
        let series = stochastic(samples, self.k_period, self.d_period);
        match self.line {
            StochasticLine::K => series.k,
            StochasticLine::D => series.d,
        }
    }
}
