//! Simple Moving Average (SMA) and the rolling-window helpers built on it.
//!
//! Rolling mean of close prices over a trailing window.
//! Lookback: period - 1 (first valid value at index period-1).

use crate::components::indicator::Indicator;
use crate::domain::Sample;

use super::closes;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, samples: &[Sample]) -> Vec<f64> {
        sma(samples, self.period)
    }
}

/// SMA of close.
pub fn sma(samples: &[Sample], period: usize) -> Vec<f64> {
    sma_of_series(&closes(samples), period)
}

/// Rolling sum over a trailing window of `period` values.
///
/// The window sum is maintained incrementally; a count of NaN values in the
/// window decides whether the output is defined.
pub fn rolling_sum(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for i in 0..n {
        let entering = values[i];
        if entering.is_nan() {
            nan_count += 1;
        } else {
            sum += entering;
        }

        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                nan_count -= 1;
            } else {
                sum -= leaving;
            }
        }

        if i + 1 >= period && nan_count == 0 {
            result[i] = sum;
        }
    }

    result
}

/// Rolling mean of an arbitrary series.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let divisor = period as f64;
    rolling_sum(values, period)
        .into_iter()
        .map(|s| s / divisor)
        .collect()
}

/// Trend: first difference of SMA(close, period).
///
/// Positive while the moving average rises. Lookback: period.
pub fn trend(samples: &[Sample], period: usize) -> Vec<f64> {
    let ma = sma(samples, period);
    let mut result = vec![f64::NAN; ma.len()];
    for i in 1..ma.len() {
        result[i] = ma[i] - ma[i - 1];
    }
    result
}

/// SMA of volume.
pub fn volume_average(samples: &[Sample], period: usize) -> Vec<f64> {
    let volumes: Vec<f64> = samples.iter().map(|s| s.volume).collect();
    sma_of_series(&volumes, period)
}
