//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR is the simple rolling mean of true range over `period`.
//! Lookback: period (the first sample has no previous close).

use crate::components::indicator::Indicator;
use crate::domain::Sample;

use super::sma_of_series;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True Range series. TR[0] is NaN: there is no previous close.
pub fn true_range(samples: &[Sample]) -> Vec<f64> {
    let n = samples.len();
    let mut tr = vec![f64::NAN; n];

    for i in 1..n {
        let h = samples[i].high;
        let l = samples[i].low;
        let pc = samples[i - 1].close;
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            continue;
        }
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }

    tr
}

pub fn atr(samples: &[Sample], period: usize) -> Vec<f64> {
    sma_of_series(&true_range(samples), period)
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, samples: &[Sample]) -> Vec<f64> {
        atr(samples, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};
    use chrono::{Duration, TimeZone, Utc};

    fn make_ohlc_samples(data: &[(f64, f64, f64, f64)]) -> Vec<Sample> {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Sample {
                timestamp: base + Duration::minutes(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn true_range_basic() {
        let samples = make_ohlc_samples(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0), // max(8, |108-102|, |100-102|) = 8
            (106.0, 107.0, 98.0, 99.0),   // max(9, |107-106|, |98-106|) = 9
        ]);
        let tr = true_range(&samples);
        assert!(tr[0].is_nan());
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let samples = make_ohlc_samples(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // max(7, |115-100|, |108-100|) = 15
        ]);
        assert_approx(true_range(&samples)[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3() {
        let samples = make_ohlc_samples(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
            (101.0, 106.0, 100.0, 105.0), // TR = 6
        ]);
        let result = Atr::new(3).compute(&samples);

        assert!(result[2].is_nan());
        assert_approx(result[3], 23.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[4], 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_lookback() {
        assert_eq!(Atr::new(14).lookback(), 14);
    }
}
