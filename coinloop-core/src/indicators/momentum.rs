//! Momentum: percent change of close over a lookback.
//!
//! momentum[t] = (close[t] - close[t-period]) / close[t-period] * 100
//! Lookback: period. Undefined when the reference close is zero.

use crate::components::indicator::Indicator;
use crate::domain::Sample;

#[derive(Debug, Clone)]
pub struct Momentum {
    period: usize,
    name: String,
}

impl Momentum {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Momentum period must be >= 1");
        Self {
            period,
            name: format!("momentum_{period}"),
        }
    }
}

impl Indicator for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, samples: &[Sample]) -> Vec<f64> {
        momentum(samples, self.period)
    }
}

pub fn momentum(samples: &[Sample], period: usize) -> Vec<f64> {
    let n = samples.len();
    let mut result = vec![f64::NAN; n];

    for i in period..n {
        let prev = samples[i - period].close;
        let curr = samples[i].close;
        if prev.is_nan() || curr.is_nan() || prev == 0.0 {
            continue;
        }
        result[i] = (curr - prev) / prev * 100.0;
    }

    result
}
