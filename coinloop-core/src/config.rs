//! Core configuration: trade limits, risk tiers, instrument registry,
//! series settings and the strategy catalog.
//!
//! Stored as TOML. Every section and field has a default, so a partial file
//! only needs the values it changes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::CandleInterval;
use crate::domain::Instrument;
use crate::strategy::StrategyKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl std::str::FromStr for RiskLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            other => Err(ConfigError::Invalid(format!("unknown risk level `{other}`"))),
        }
    }
}

/// Protective exit levels and position cap for one risk level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskTier {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    /// Largest share of the quote balance a single trade may use.
    pub max_amount_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    pub low: RiskTier,
    pub medium: RiskTier,
    pub high: RiskTier,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            low: RiskTier {
                stop_loss_pct: 2.0,
                take_profit_pct: 3.0,
                max_amount_ratio: 0.3,
            },
            medium: RiskTier {
                stop_loss_pct: 3.0,
                take_profit_pct: 5.0,
                max_amount_ratio: 0.5,
            },
            high: RiskTier {
                stop_loss_pct: 5.0,
                take_profit_pct: 8.0,
                max_amount_ratio: 0.8,
            },
        }
    }
}

impl RiskSettings {
    pub fn tier(&self, level: RiskLevel) -> &RiskTier {
        match level {
            RiskLevel::Low => &self.low,
            RiskLevel::Medium => &self.medium,
            RiskLevel::High => &self.high,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeSettings {
    pub default_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
    /// Overrides the risk tier's stop-loss when set.
    pub stop_loss_pct: Option<f64>,
    /// Overrides the risk tier's take-profit when set.
    pub take_profit_pct: Option<f64>,
    pub use_stop_loss: bool,
    pub use_take_profit: bool,
    /// Seconds between polling cycles.
    pub interval_secs: u64,
    pub risk_level: RiskLevel,
}

impl Default for TradeSettings {
    fn default() -> Self {
        Self {
            default_amount: 100_000.0,
            min_amount: 5_000.0,
            max_amount: 1_000_000.0,
            stop_loss_pct: None,
            take_profit_pct: None,
            use_stop_loss: true,
            use_take_profit: true,
            interval_secs: 1,
            risk_level: RiskLevel::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesSettings {
    /// Maximum samples kept in the series buffer.
    pub retention: usize,
    pub candle_interval: CandleInterval,
    /// Samples requested per fetch.
    pub fetch_count: usize,
}

impl Default for SeriesSettings {
    fn default() -> Self {
        Self {
            retention: 200,
            candle_interval: CandleInterval::Minute5,
            fetch_count: 200,
        }
    }
}

/// Catalog metadata for one strategy kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyInfo {
    pub name: String,
    pub description: String,
    /// Distance of the target buy/sell prices from the current price, in %.
    pub target_band_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub trade: TradeSettings,
    pub risk: RiskSettings,
    /// Recognized instruments by group name.
    pub instruments: BTreeMap<String, Vec<Instrument>>,
    pub series: SeriesSettings,
    pub strategies: BTreeMap<StrategyKind, StrategyInfo>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            trade: TradeSettings::default(),
            risk: RiskSettings::default(),
            instruments: default_instruments(),
            series: SeriesSettings::default(),
            strategies: default_catalog(),
        }
    }
}

impl CoreConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.trade;
        if !(t.min_amount > 0.0 && t.min_amount <= t.max_amount) {
            return Err(ConfigError::Invalid(format!(
                "trade amounts need 0 < min ({}) <= max ({})",
                t.min_amount, t.max_amount
            )));
        }
        if !(t.min_amount..=t.max_amount).contains(&t.default_amount) {
            return Err(ConfigError::Invalid(format!(
                "default amount {} outside [{}, {}]",
                t.default_amount, t.min_amount, t.max_amount
            )));
        }
        for (level, tier) in [
            ("LOW", &self.risk.low),
            ("MEDIUM", &self.risk.medium),
            ("HIGH", &self.risk.high),
        ] {
            if !(tier.max_amount_ratio > 0.0 && tier.max_amount_ratio <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "risk tier {level}: max_amount_ratio must be in (0, 1]"
                )));
            }
            if tier.stop_loss_pct <= 0.0 || tier.take_profit_pct <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "risk tier {level}: exit levels must be positive"
                )));
            }
        }
        if self.series.retention == 0 || self.series.fetch_count == 0 {
            return Err(ConfigError::Invalid(
                "series retention and fetch_count must be >= 1".into(),
            ));
        }
        Ok(())
    }

    pub fn risk_tier(&self) -> &RiskTier {
        self.risk.tier(self.trade.risk_level)
    }

    /// Stop-loss distance in %, or `None` when disabled.
    pub fn stop_loss_pct(&self) -> Option<f64> {
        self.trade
            .use_stop_loss
            .then(|| self.trade.stop_loss_pct.unwrap_or(self.risk_tier().stop_loss_pct))
    }

    /// Take-profit distance in %, or `None` when disabled.
    pub fn take_profit_pct(&self) -> Option<f64> {
        self.trade
            .use_take_profit
            .then(|| self.trade.take_profit_pct.unwrap_or(self.risk_tier().take_profit_pct))
    }

    pub fn is_recognized(&self, instrument: &Instrument) -> bool {
        self.instruments
            .values()
            .any(|group| group.contains(instrument))
    }

    pub fn all_instruments(&self) -> Vec<&Instrument> {
        self.instruments.values().flatten().collect()
    }

    pub fn strategy_info(&self, kind: StrategyKind) -> Option<&StrategyInfo> {
        self.strategies.get(&kind)
    }

    /// Target band for `kind`, 1% when the catalog has no entry.
    pub fn target_band_pct(&self, kind: StrategyKind) -> f64 {
        self.strategy_info(kind).map_or(1.0, |info| info.target_band_pct)
    }
}

fn group(codes: &[&str]) -> Vec<Instrument> {
    codes
        .iter()
        .filter_map(|code| Instrument::parse(code).ok())
        .collect()
}

fn default_instruments() -> BTreeMap<String, Vec<Instrument>> {
    let mut groups = BTreeMap::new();
    groups.insert(
        "major".into(),
        group(&["KRW-BTC", "KRW-ETH", "KRW-XRP", "KRW-SOL", "KRW-ADA"]),
    );
    groups.insert(
        "defi".into(),
        group(&["KRW-AAVE", "KRW-UNI", "KRW-SUSHI", "KRW-COMP", "KRW-MKR"]),
    );
    groups.insert(
        "gaming".into(),
        group(&["KRW-SAND", "KRW-MANA", "KRW-AXS", "KRW-ENJ", "KRW-WEMIX"]),
    );
    groups.insert(
        "infrastructure".into(),
        group(&["KRW-MATIC", "KRW-DOT", "KRW-ATOM", "KRW-AVAX", "KRW-NEAR"]),
    );
    groups.insert(
        "emerging".into(),
        group(&["KRW-APT", "KRW-SUI", "KRW-INJ", "KRW-SEI", "KRW-BLUR"]),
    );
    groups.insert(
        "altcoins".into(),
        group(&["KRW-DOGE", "KRW-SHIB", "KRW-VET", "KRW-CHZ", "KRW-LINK"]),
    );
    groups
}

fn default_catalog() -> BTreeMap<StrategyKind, StrategyInfo> {
    let entries: [(StrategyKind, &str, &str); 18] = [
        (StrategyKind::Rsi, "RSI", "overbought/oversold zones"),
        (StrategyKind::Macd, "MACD", "trend following"),
        (StrategyKind::Bollinger, "Bollinger Bands", "volatility breakout"),
        (StrategyKind::Sma, "Moving Average", "golden/dead cross"),
        (StrategyKind::Vwap, "VWAP", "volume-weighted average price"),
        (StrategyKind::Stochastic, "Stochastic", "momentum oscillator"),
        (StrategyKind::Ichimoku, "Ichimoku", "cloud chart analysis"),
        (StrategyKind::SuperTrend, "SuperTrend", "trend following"),
        (StrategyKind::Dmi, "DMI/ADX", "trend strength"),
        (StrategyKind::Williams, "Williams %R", "momentum oscillator"),
        (StrategyKind::TrendFollow, "Trend Follow", "MACD + RSI"),
        (StrategyKind::VolBreakout, "Volatility Breakout", "BB + volume"),
        (StrategyKind::MultiMa, "Multi MA", "triple moving average"),
        (StrategyKind::MomentumRev, "Momentum Reversal", "RSI + stochastic"),
        (StrategyKind::VolumeBreak, "Volume Breakout", "volume + price"),
        (StrategyKind::AiBasic, "AI Basic", "basic indicator combination"),
        (StrategyKind::AiAdvanced, "AI Advanced", "advanced indicator analysis"),
        (StrategyKind::AiFull, "AI Full", "full market analysis"),
    ];

    entries
        .into_iter()
        .map(|(kind, name, description)| {
            let target_band_pct = if kind == StrategyKind::Rsi { 2.0 } else { 1.0 };
            (
                kind,
                StrategyInfo {
                    name: name.into(),
                    description: description.into(),
                    target_band_pct,
                },
            )
        })
        .collect()
}
