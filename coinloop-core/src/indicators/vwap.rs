//! Rolling Volume-Weighted Average Price (VWAP).
//!
//! vwap = sum(close * volume, period) / sum(volume, period)
//! Undefined when the window's volume sums to zero.
//! Lookback: period - 1.

use crate::components::indicator::Indicator;
use crate::domain::Sample;

use super::rolling_sum;

#[derive(Debug, Clone)]
pub struct Vwap {
    period: usize,
    name: String,
}

impl Vwap {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "VWAP period must be >= 1");
        Self {
            period,
            name: format!("vwap_{period}"),
        }
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, samples: &[Sample]) -> Vec<f64> {
        vwap(samples, self.period)
    }
}

pub fn vwap(samples: &[Sample], period: usize) -> Vec<f64> {
    let turnover: Vec<f64> = samples.iter().map(Sample::turnover).collect();
    let volume: Vec<f64> = samples.iter().map(|s| s.volume).collect();
    rolling_sum(&turnover, period)
        .into_iter()
        .zip(rolling_sum(&volume, period))
        .map(|(pv, v)| if v > 0.0 { pv / v } else { f64::NAN })
        .collect()
}
