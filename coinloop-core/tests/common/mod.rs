//! Shared fixtures for integration tests.

#![allow(dead_code)]

use chrono::{Duration, TimeZone, Utc};
use coinloop_core::domain::Sample;

/// Synthetic samples from closes: open = previous close, one-unit wicks,
/// constant volume, one minute apart.
pub fn samples_from_closes(closes: &[f64]) -> Vec<Sample> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Sample::new(
                base + Duration::minutes(i as i64),
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// 30 closes rising monotonically from 100 to 130.
pub fn rising_closes() -> Vec<f64> {
    (0..30).map(|i| 100.0 + i as f64 * 30.0 / 29.0).collect()
}

/// Sine wave around 100.
pub fn wave_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + 10.0 * (i as f64 * 0.3).sin())
        .collect()
}
