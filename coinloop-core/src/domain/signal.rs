//! Signal: the outcome of one evaluation cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction of a fired signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalKind {
    Buy,
    Sell,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Buy => "BUY",
            SignalKind::Sell => "SELL",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fired BUY or SELL signal.
///
/// A cycle without a signal is represented by `Option::<Signal>::None`, so a
/// signal always carries a price and a reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub price: f64,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    pub fn buy(price: f64, reason: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: SignalKind::Buy,
            price,
            reason: reason.into(),
            timestamp,
        }
    }

    pub fn sell(price: f64, reason: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: SignalKind::Sell,
            price,
            reason: reason.into(),
            timestamp,
        }
    }
}
