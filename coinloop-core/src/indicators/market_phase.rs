//! Market phase: z-score of close against its rolling mean, bucketed.
//!
//! z = (close - SMA(close, period)) / stddev(close, period)
//! Buckets are right-inclusive at the fixed edges -2, -0.5, 0.5, 2.
//! A zero stddev leaves z and the phase undefined.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Sample;

use super::bollinger::rolling_mean_std;
use super::closes;

/// Five ordered market regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarketPhase {
    StrongBear,
    Bear,
    Neutral,
    Bull,
    StrongBull,
}

impl MarketPhase {
    pub const EDGES: [f64; 4] = [-2.0, -0.5, 0.5, 2.0];

    pub fn from_z_score(z: f64) -> Option<Self> {
        if z.is_nan() {
            return None;
        }
        let [e0, e1, e2, e3] = Self::EDGES;
        Some(if z <= e0 {
            Self::StrongBear
        } else if z <= e1 {
            Self::Bear
        } else if z <= e2 {
            Self::Neutral
        } else if z <= e3 {
            Self::Bull
        } else {
            Self::StrongBull
        })
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, Self::Bull | Self::StrongBull)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, Self::Bear | Self::StrongBear)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StrongBear => "Strong Bear",
            Self::Bear => "Bear",
            Self::Neutral => "Neutral",
            Self::Bull => "Bull",
            Self::StrongBull => "Strong Bull",
        }
    }
}

impl fmt::Display for MarketPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Z-score of close against its rolling mean/stddev. Lookback: period - 1.
pub fn z_scores(samples: &[Sample], period: usize) -> Vec<f64> {
    let close = closes(samples);
    let (mean, std) = rolling_mean_std(&close, period);
    close
        .iter()
        .zip(mean.iter().zip(&std))
        .map(|(c, (m, s))| if *s > 0.0 { (c - m) / s } else { f64::NAN })
        .collect()
}

pub fn market_phase(samples: &[Sample], period: usize) -> Vec<Option<MarketPhase>> {
    z_scores(samples, period)
        .into_iter()
        .map(MarketPhase::from_z_score)
        .collect()
}
