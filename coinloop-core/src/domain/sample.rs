//! Sample: one OHLCV bucket for a single instrument.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV sample for one time bucket.
///
/// Samples are immutable once appended to a [`Series`](super::Series).
/// Volume is fractional because crypto volume is quoted in base-coin units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Sample {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// OHLCV sanity: high >= low, high bounds open/close from above, low bounds
    /// them from below, volume is non-negative.
    pub fn is_well_formed(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
            && self.volume >= 0.0
    }

    /// Close × volume, the numerator term of VWAP.
    pub fn turnover(&self) -> f64 {
        self.close * self.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Sample {
        Sample::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
            100.0,
            105.0,
            98.0,
            103.0,
            12.5,
        )
    }

    #[test]
    fn sample_is_well_formed() {
        assert!(sample().is_well_formed());
    }

    #[test]
    fn sample_detects_void() {
        let mut s = sample();
        s.close = f64::NAN;
        assert!(s.is_void());
        assert!(!s.is_well_formed());
    }

    #[test]
    fn sample_rejects_inverted_range() {
        let mut s = sample();
        s.high = 97.0;
        assert!(!s.is_well_formed());
    }

    #[test]
    fn sample_rejects_negative_volume() {
        let mut s = sample();
        s.volume = -1.0;
        assert!(!s.is_well_formed());
    }

    #[test]
    fn sample_serialization_roundtrip() {
        let s = sample();
        let json = serde_json::to_string(&s).unwrap();
        let deser: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(s, deser);
    }
}
