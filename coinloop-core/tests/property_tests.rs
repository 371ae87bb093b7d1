//! Property tests for indicator and series invariants.
//!
//! Uses proptest to verify:
//! 1. RSI stays within [0, 100]
//! 2. Bollinger bands are ordered lower <= middle <= upper
//! 3. No lookahead: a value at index i only depends on samples[..=i]
//! 4. MACD line is positive on a strictly rising ramp
//! 5. Series keeps the newest `capacity` samples in order

mod common;

use common::samples_from_closes;
use coinloop_core::components::Indicator;
use coinloop_core::domain::{Instrument, Series};
use coinloop_core::indicators::{bollinger, macd, rsi, standard_indicators, stochastic};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(10.0..1000.0_f64, min_len..max_len)
        .prop_map(|v| v.into_iter().map(|c| (c * 100.0).round() / 100.0).collect())
}

fn same(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || (a - b).abs() <= 1e-9 * a.abs().max(1.0)
}

// ── 1. RSI bounds ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded(closes in arb_closes(2, 120), period in 2usize..30) {
        let samples = samples_from_closes(&closes);
        for (i, v) in rsi(&samples, period).into_iter().enumerate() {
            if i < period {
                prop_assert!(v.is_nan());
            } else {
                prop_assert!((0.0..=100.0).contains(&v), "rsi[{}] = {}", i, v);
            }
        }
    }
}

// ── 2. Bollinger ordering ────────────────────────────────────────────

proptest! {
    #[test]
    fn bollinger_bands_are_ordered(
        closes in arb_closes(1, 120),
        period in 2usize..40,
        multiplier in 0.5..3.0_f64,
    ) {
        let samples = samples_from_closes(&closes);
        let bands = bollinger(&samples, period, multiplier);
        for i in 0..samples.len() {
            let (lo, mid, up) = (bands.lower[i], bands.middle[i], bands.upper[i]);
            if mid.is_nan() {
                prop_assert!(i + 1 < period);
                continue;
            }
            prop_assert!(lo <= mid + 1e-9 && mid <= up + 1e-9);
        }
    }

    #[test]
    fn stochastic_stays_in_range(closes in arb_closes(1, 120)) {
        let samples = samples_from_closes(&closes);
        let series = stochastic(&samples, 14, 3);
        for v in series.k.iter().chain(&series.d).filter(|v| !v.is_nan()) {
            prop_assert!((0.0..=100.0).contains(v));
        }
    }
}

// ── 3. No lookahead ──────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn indicators_do_not_look_ahead(closes in arb_closes(40, 90), cut in 1usize..40) {
        let samples = samples_from_closes(&closes);
        let prefix = &samples[..samples.len() - cut];
        for indicator in standard_indicators() {
            let full = indicator.compute(&samples);
            let partial = indicator.compute(prefix);
            for i in 0..prefix.len() {
                prop_assert!(
                    same(full[i], partial[i]),
                    "{} differs at {}: {} vs {}",
                    indicator.name(), i, full[i], partial[i]
                );
            }
        }
    }
}

// ── 4. MACD sign ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn macd_line_positive_on_rising_ramp(start in 10.0..500.0_f64, step in 0.01..5.0_f64) {
        let closes: Vec<f64> = (0..80).map(|i| start + step * i as f64).collect();
        let samples = samples_from_closes(&closes);
        let series = macd(&samples, 12, 26, 9);
        for v in series.line.iter().filter(|v| !v.is_nan()) {
            prop_assert!(*v > 0.0);
        }
        prop_assert!(series.line.iter().any(|v| !v.is_nan()));
    }
}

// ── 5. Series retention ──────────────────────────────────────────────

proptest! {
    #[test]
    fn series_keeps_newest_in_order(closes in arb_closes(1, 300), capacity in 1usize..200) {
        let samples = samples_from_closes(&closes);
        let mut series = Series::new(Instrument::parse("KRW-BTC").unwrap(), capacity).unwrap();
        for s in &samples {
            series.push(*s).unwrap();
        }
        let keep = samples.len().min(capacity);
        prop_assert_eq!(series.len(), keep);
        prop_assert_eq!(series.samples(), &samples[samples.len() - keep..]);

        let k = keep / 2;
        prop_assert_eq!(series.tail(k), &samples[samples.len() - k..]);
    }
}
