//! Account collaborator: exchange price, candle and balance queries.
//!
//! The session only talks to the [`AccountCollaborator`] trait, so live
//! exchange clients, recorded replays and synthetic feeds are
//! interchangeable. Every failure is recoverable: the session treats it as
//! "data unavailable" and skips the cycle.

pub mod replay;
pub mod synthetic;

pub use replay::{read_samples_csv, ReplayAccount};
pub use synthetic::SyntheticAccount;

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RiskTier;
use crate::domain::{Instrument, Sample};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("price unavailable for {instrument}: {reason}")]
    PriceUnavailable { instrument: String, reason: String },

    #[error("series unavailable for {instrument}: {reason}")]
    SeriesUnavailable { instrument: String, reason: String },

    #[error("balance unavailable for {instrument}: {reason}")]
    BalanceUnavailable { instrument: String, reason: String },

    #[error("instrument {0} is not served by this account")]
    UnknownInstrument(String),

    #[error("replay exhausted after {0} samples")]
    Exhausted(usize),

    #[error("amount {amount} exceeds the {ratio} balance cap of {limit}")]
    InsufficientBalance { amount: f64, ratio: f64, limit: f64 },

    #[error("read samples: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid sample row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

/// Latest traded price with 24h context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: f64,
    /// Fractional change over the last 24 hours (0.01 = +1%).
    pub change_rate_24h: f64,
    pub volume_24h: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Balance {
    pub quote_balance: f64,
    pub base_balance: f64,
}

/// Candle bucket size, named as the exchange API names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CandleInterval {
    Minute1,
    Minute3,
    #[default]
    Minute5,
    Minute10,
    Minute15,
    Minute30,
    Minute60,
    Minute240,
    Day,
    Week,
    Month,
}

impl CandleInterval {
    pub const ALL: [CandleInterval; 11] = [
        Self::Minute1,
        Self::Minute3,
        Self::Minute5,
        Self::Minute10,
        Self::Minute15,
        Self::Minute30,
        Self::Minute60,
        Self::Minute240,
        Self::Day,
        Self::Week,
        Self::Month,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute1 => "minute1",
            Self::Minute3 => "minute3",
            Self::Minute5 => "minute5",
            Self::Minute10 => "minute10",
            Self::Minute15 => "minute15",
            Self::Minute30 => "minute30",
            Self::Minute60 => "minute60",
            Self::Minute240 => "minute240",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Nominal bucket length. A month counts as 30 days.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Minute1 => Duration::minutes(1),
            Self::Minute3 => Duration::minutes(3),
            Self::Minute5 => Duration::minutes(5),
            Self::Minute10 => Duration::minutes(10),
            Self::Minute15 => Duration::minutes(15),
            Self::Minute30 => Duration::minutes(30),
            Self::Minute60 => Duration::hours(1),
            Self::Minute240 => Duration::hours(4),
            Self::Day => Duration::days(1),
            Self::Week => Duration::weeks(1),
            Self::Month => Duration::days(30),
        }
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandleInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|i| i.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown candle interval `{s}`"))
    }
}

/// Exchange-side queries the trading session depends on.
///
/// Methods take `&self`; implementations that keep cursors or caches use
/// interior mutability so one account can be shared across threads.
pub trait AccountCollaborator: Send + Sync {
    /// Human-readable name of this account source.
    fn name(&self) -> &str;

    fn current_price(&self, instrument: &Instrument) -> Result<PriceQuote, AccountError>;

    /// Up to `count` most recent candles, oldest first.
    fn series(
        &self,
        instrument: &Instrument,
        interval: CandleInterval,
        count: usize,
    ) -> Result<Vec<Sample>, AccountError>;

    fn balance(&self, instrument: &Instrument) -> Result<Balance, AccountError>;
}

/// Check `amount` against the risk tier's cap on the quote balance.
///
/// Returns the cap on success.
pub fn balance_guard(amount: f64, balance: &Balance, tier: &RiskTier) -> Result<f64, AccountError> {
    let limit = balance.quote_balance * tier.max_amount_ratio;
    if amount > limit {
        return Err(AccountError::InsufficientBalance {
            amount,
            ratio: tier.max_amount_ratio,
            limit,
        });
    }
    Ok(limit)
}

/// Quote derived from the newest sample and the samples of the trailing 24h.
pub(crate) fn quote_from_history(samples: &[Sample]) -> Option<PriceQuote> {
    let last = samples.last()?;
    let cutoff = last.timestamp - Duration::hours(24);
    let window: Vec<&Sample> = samples
        .iter()
        .filter(|s| s.timestamp > cutoff)
        .collect();
    let first = window.first()?;
    let change_rate_24h = if first.open > 0.0 {
        last.close / first.open - 1.0
    } else {
        0.0
    };
    Some(PriceQuote {
        price: last.close,
        change_rate_24h,
        volume_24h: window.iter().map(|s| s.volume).sum(),
    })
}
