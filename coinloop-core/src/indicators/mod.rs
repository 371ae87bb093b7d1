//! Indicator library.
//!
//! Batch functions compute a full series aligned with the input samples; the
//! `Indicator` implementations wrap them under stable names. The
//! [`incremental`] module holds O(1)-per-sample counterparts for live use.
//!
//! Conventions shared by every function here:
//! - output length equals input length;
//! - values before the warm-up, and values that are mathematically undefined
//!   (zero range, zero volume), are `f64::NAN`;
//! - a NaN input poisons every window that contains it.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod incremental;
pub mod macd;
pub mod market_phase;
pub mod momentum;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod volatility;
pub mod vwap;

pub use atr::{atr, true_range, Atr};
pub use bollinger::{bollinger, rolling_std_of_series, Bollinger, BollingerBand, BollingerBands};
pub use ema::{ema_of_series, Ema};
pub use incremental::{EmaState, LiveIndicators, LiveReadings, MacdState, RollingExtrema, RollingStats, RsiState};
pub use macd::{macd, Macd, MacdLine, MacdSeries};
pub use market_phase::{market_phase, z_scores, MarketPhase};
pub use momentum::{momentum, Momentum};
pub use rsi::{rsi, Rsi};
pub use sma::{rolling_sum, sma, sma_of_series, trend, volume_average, Sma};
pub use stochastic::{stochastic, Stochastic, StochasticLine, StochasticSeries};
pub use volatility::{pct_returns, volatility, Volatility};
pub use vwap::{vwap, Vwap};

use crate::components::Indicator;
use crate::domain::Sample;

/// Last value of a series if it is defined.
///
/// Strategies decide on the latest sample only, so an undefined tail means
/// "no reading" even when earlier values exist.
pub fn last_defined(values: &[f64]) -> Option<f64> {
    values.last().copied().filter(|v| !v.is_nan())
}

/// Value `back` positions before the end, if defined.
pub fn defined_at_end(values: &[f64], back: usize) -> Option<f64> {
    let idx = values.len().checked_sub(1 + back)?;
    Some(values[idx]).filter(|v| !v.is_nan())
}

/// Replace the first `lookback` values with NaN.
pub(crate) fn mask_warmup(mut values: Vec<f64>, lookback: usize) -> Vec<f64> {
    for v in values.iter_mut().take(lookback) {
        *v = f64::NAN;
    }
    values
}

pub(crate) fn closes(samples: &[Sample]) -> Vec<f64> {
    samples.iter().map(|s| s.close).collect()
}

/// The default indicator set shown by analysis views.
pub fn standard_indicators() -> Vec<Box<dyn Indicator>> {
    vec![
        Box::new(Rsi::new(14)),
        Box::new(Macd::line(12, 26, 9)),
        Box::new(Macd::signal(12, 26, 9)),
        Box::new(Macd::histogram(12, 26, 9)),
        Box::new(Bollinger::upper(20, 2.0)),
        Box::new(Bollinger::middle(20, 2.0)),
        Box::new(Bollinger::lower(20, 2.0)),
        Box::new(Stochastic::k(14, 3)),
        Box::new(Stochastic::d(14, 3)),
        Box::new(Sma::new(5)),
        Box::new(Sma::new(20)),
        Box::new(Ema::new(20)),
        Box::new(Vwap::new(14)),
        Box::new(Atr::new(14)),
        Box::new(Momentum::new(14)),
        Box::new(Volatility::new(20)),
    ]
}

/// Create synthetic samples from close prices for testing.
///
/// Generates plausible OHLCV: open = prev_close (or close for the first
/// sample), high = max(open,close) + 1.0, low = min(open,close) - 1.0,
/// volume = 1000, one minute apart.
#[cfg(test)]
pub fn make_samples(closes: &[f64]) -> Vec<Sample> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Sample {
                timestamp: base + Duration::minutes(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_defined_skips_nan_tail() {
        assert_eq!(last_defined(&[1.0, 2.0]), Some(2.0));
        assert_eq!(last_defined(&[1.0, f64::NAN]), None);
        assert_eq!(last_defined(&[]), None);
    }

    #[test]
    fn defined_at_end_indexes_from_tail() {
        let v = [1.0, 2.0, 3.0];
        assert_eq!(defined_at_end(&v, 0), Some(3.0));
        assert_eq!(defined_at_end(&v, 2), Some(1.0));
        assert_eq!(defined_at_end(&v, 3), None);
    }

    #[test]
    fn standard_indicators_are_aligned() {
        let samples = make_samples(&(0..60).map(|i| 100.0 + (i as f64).sin()).collect::<Vec<_>>());
        for ind in standard_indicators() {
            let out = ind.compute(&samples);
            assert_eq!(out.len(), samples.len(), "{} misaligned", ind.name());
            assert!(
                out.iter().take(ind.lookback()).all(|v| v.is_nan()),
                "{} defined before lookback",
                ind.name()
            );
            assert!(ind.latest(&samples).is_some(), "{} undefined at end", ind.name());
        }
    }
}
