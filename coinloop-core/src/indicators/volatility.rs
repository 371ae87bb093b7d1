//! Volatility: rolling population stddev of one-step percent returns.
//!
//! return[t] = close[t] / close[t-1] - 1
//! volatility[t] = stddev(return, period)
//! Lookback: period.

use crate::components::indicator::Indicator;
use crate::domain::Sample;

use super::rolling_std_of_series;

#[derive(Debug, Clone)]
pub struct Volatility {
    period: usize,
    name: String,
}

impl Volatility {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Volatility period must be >= 1");
        Self {
            period,
            name: format!("volatility_{period}"),
        }
    }
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, samples: &[Sample]) -> Vec<f64> {
        volatility(samples, self.period)
    }
}

/// One-step fractional returns. The first value is NaN.
pub fn pct_returns(samples: &[Sample]) -> Vec<f64> {
    let n = samples.len();
    let mut result = vec![f64::NAN; n];
    for i in 1..n {
        let prev = samples[i - 1].close;
        if prev != 0.0 {
            result[i] = samples[i].close / prev - 1.0;
        }
    }
    result
}

pub fn volatility(samples: &[Sample], period: usize) -> Vec<f64> {
    rolling_std_of_series(&pct_returns(samples), period)
}
