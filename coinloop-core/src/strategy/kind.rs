//! Strategy catalog keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every strategy the catalog knows about, implemented or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StrategyKind {
    Rsi,
    Macd,
    Bollinger,
    Sma,
    Vwap,
    Stochastic,
    Ichimoku,
    SuperTrend,
    Dmi,
    Williams,
    TrendFollow,
    VolBreakout,
    MultiMa,
    MomentumRev,
    VolumeBreak,
    AiBasic,
    AiAdvanced,
    AiFull,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy `{0}`")]
pub struct UnknownStrategy(pub String);

impl StrategyKind {
    pub const ALL: [StrategyKind; 18] = [
        Self::Rsi,
        Self::Macd,
        Self::Bollinger,
        Self::Sma,
        Self::Vwap,
        Self::Stochastic,
        Self::Ichimoku,
        Self::SuperTrend,
        Self::Dmi,
        Self::Williams,
        Self::TrendFollow,
        Self::VolBreakout,
        Self::MultiMa,
        Self::MomentumRev,
        Self::VolumeBreak,
        Self::AiBasic,
        Self::AiAdvanced,
        Self::AiFull,
    ];

    /// Catalog key, as used in configuration files and on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Rsi => "RSI",
            Self::Macd => "MACD",
            Self::Bollinger => "BB",
            Self::Sma => "SMA",
            Self::Vwap => "VWAP",
            Self::Stochastic => "Stochastic",
            Self::Ichimoku => "Ichimoku",
            Self::SuperTrend => "SuperTrend",
            Self::Dmi => "DMI",
            Self::Williams => "Williams",
            Self::TrendFollow => "TrendFollow",
            Self::VolBreakout => "VolBreakout",
            Self::MultiMa => "MultiMA",
            Self::MomentumRev => "MomentumRev",
            Self::VolumeBreak => "VolumeBreak",
            Self::AiBasic => "AI_Basic",
            Self::AiAdvanced => "AI_Advanced",
            Self::AiFull => "AI_Full",
        }
    }

    /// Whether a decision rule exists for this kind.
    pub fn is_implemented(&self) -> bool {
        matches!(
            self,
            Self::Rsi
                | Self::Macd
                | Self::Bollinger
                | Self::Sma
                | Self::Vwap
                | Self::Stochastic
                | Self::AiBasic
                | Self::AiAdvanced
                | Self::AiFull
        )
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::AiBasic | Self::AiAdvanced | Self::AiFull)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for StrategyKind {
    type Err = UnknownStrategy;

    /// Case-insensitive; `-` and `_` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(&wanted))
            .or_else(|| {
                if wanted.eq_ignore_ascii_case("bollinger") {
                    Some(Self::Bollinger)
                } else {
                    None
                }
            })
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

impl TryFrom<String> for StrategyKind {
    type Error = UnknownStrategy;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StrategyKind> for String {
    fn from(kind: StrategyKind) -> Self {
        kind.key().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.key().parse::<StrategyKind>(), Ok(kind));
        }
    }

    #[test]
    fn parsing_is_lenient() {
        assert_eq!("rsi".parse(), Ok(StrategyKind::Rsi));
        assert_eq!("ai-full".parse(), Ok(StrategyKind::AiFull));
        assert_eq!("Bollinger".parse(), Ok(StrategyKind::Bollinger));
        assert!("Martingale".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn nine_kinds_are_implemented() {
        let implemented = StrategyKind::ALL
            .iter()
            .filter(|k| k.is_implemented())
            .count();
        assert_eq!(implemented, 9);
        assert!(!StrategyKind::Ichimoku.is_implemented());
    }

    #[test]
    fn serde_uses_catalog_key() {
        let json = serde_json::to_string(&StrategyKind::AiAdvanced).unwrap();
        assert_eq!(json, "\"AI_Advanced\"");
        let back: StrategyKind = serde_json::from_str("\"BB\"").unwrap();
        assert_eq!(back, StrategyKind::Bollinger);
    }
}
