//! Single-indicator decision rules.
//!
//! Each rule reads the latest indicator values only. An undefined value
//! makes every comparison it takes part in false.

use std::collections::BTreeMap;

use crate::domain::Sample;
use crate::indicators::{
    bollinger, last_defined, macd, rsi, sma, stochastic, vwap,
    macd::signal_lookback,
};

use super::Evaluation;

pub(crate) fn lt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a < b)
}

pub(crate) fn gt(a: Option<f64>, b: Option<f64>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a > b)
}

pub(crate) fn record(readouts: &mut BTreeMap<String, f64>, name: &str, value: Option<f64>) {
    if let Some(v) = value {
        readouts.insert(name.to_string(), v);
    }
}

pub(crate) fn last_close(samples: &[Sample]) -> Option<f64> {
    samples.last().map(|s| s.close).filter(|c| !c.is_nan())
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

/// Latest RSI, MACD pair and Bollinger bands; shared by the rules below and
/// the composite tiers.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CoreReadings {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub signal: Option<f64>,
    pub upper: Option<f64>,
    pub middle: Option<f64>,
    pub lower: Option<f64>,
}

/// Buy below `oversold`, sell above `overbought`.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiRule {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiRule {
    fn default() -> Self {
        Self {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl RsiRule {
    pub fn warmup(&self) -> usize {
        self.period + 1
    }

    pub(crate) fn reading(&self, samples: &[Sample]) -> Option<f64> {
        last_defined(&rsi(samples, self.period))
    }

    pub fn evaluate(&self, samples: &[Sample]) -> Evaluation {
        let value = self.reading(samples);
        let mut eval = Evaluation::ready();
        record(&mut eval.readouts, "rsi", value);
        eval.buy = lt(value, Some(self.oversold));
        eval.sell = gt(value, Some(self.overbought));
        eval.with_reason(
            format!("rsi {} below {}", fmt_opt(value), self.oversold),
            format!("rsi {} above {}", fmt_opt(value), self.overbought),
        )
    }
}

/// Buy while the MACD line is above its signal line, sell while below.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdRule {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdRule {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl MacdRule {
    pub fn warmup(&self) -> usize {
        signal_lookback(self.slow, self.signal) + 1
    }

    pub(crate) fn reading(&self, samples: &[Sample]) -> (Option<f64>, Option<f64>) {
        let m = macd(samples, self.fast, self.slow, self.signal);
        (last_defined(&m.line), last_defined(&m.signal))
    }

    pub fn evaluate(&self, samples: &[Sample]) -> Evaluation {
        let (line, signal) = self.reading(samples);
        let mut eval = Evaluation::ready();
        record(&mut eval.readouts, "macd", line);
        record(&mut eval.readouts, "macd_signal", signal);
        record(
            &mut eval.readouts,
            "macd_histogram",
            line.zip(signal).map(|(l, s)| l - s),
        );
        eval.buy = gt(line, signal);
        eval.sell = lt(line, signal);
        eval.with_reason(
            format!("macd {} above signal {}", fmt_opt(line), fmt_opt(signal)),
            format!("macd {} below signal {}", fmt_opt(line), fmt_opt(signal)),
        )
    }
}

/// Buy below the lower band, sell above the upper band.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerRule {
    pub period: usize,
    pub multiplier: f64,
}

impl Default for BollingerRule {
    fn default() -> Self {
        Self {
            period: 20,
            multiplier: 2.0,
        }
    }
}

impl BollingerRule {
    pub fn warmup(&self) -> usize {
        self.period
    }

    pub(crate) fn reading(&self, samples: &[Sample]) -> (Option<f64>, Option<f64>, Option<f64>) {
        let bands = bollinger(samples, self.period, self.multiplier);
        (
            last_defined(&bands.upper),
            last_defined(&bands.middle),
            last_defined(&bands.lower),
        )
    }

    pub fn evaluate(&self, samples: &[Sample]) -> Evaluation {
        let (upper, middle, lower) = self.reading(samples);
        let close = last_close(samples);
        let mut eval = Evaluation::ready();
        record(&mut eval.readouts, "bb_upper", upper);
        record(&mut eval.readouts, "bb_middle", middle);
        record(&mut eval.readouts, "bb_lower", lower);
        eval.buy = lt(close, lower);
        eval.sell = gt(close, upper);
        eval.with_reason(
            format!("close {} below lower band {}", fmt_opt(close), fmt_opt(lower)),
            format!("close {} above upper band {}", fmt_opt(close), fmt_opt(upper)),
        )
    }
}

/// Buy when %K is below 20 and above %D; sell when above 80 and below %D.
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticRule {
    pub k_period: usize,
    pub d_period: usize,
}

impl Default for StochasticRule {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
        }
    }
}

impl StochasticRule {
    pub const OVERSOLD: f64 = 20.0;
    pub const OVERBOUGHT: f64 = 80.0;

    pub fn warmup(&self) -> usize {
        (self.k_period + self.d_period).saturating_sub(1)
    }

    pub fn evaluate(&self, samples: &[Sample]) -> Evaluation {
        let st = stochastic(samples, self.k_period, self.d_period);
        let k = last_defined(&st.k);
        let d = last_defined(&st.d);
        let mut eval = Evaluation::ready();
        record(&mut eval.readouts, "stoch_k", k);
        record(&mut eval.readouts, "stoch_d", d);
        eval.buy = lt(k, Some(Self::OVERSOLD)) && gt(k, d);
        eval.sell = gt(k, Some(Self::OVERBOUGHT)) && lt(k, d);
        eval.with_reason(
            format!("%K {} oversold and above %D {}", fmt_opt(k), fmt_opt(d)),
            format!("%K {} overbought and below %D {}", fmt_opt(k), fmt_opt(d)),
        )
    }
}

/// Short/long simple moving average comparison. Re-fires on every
/// evaluation while the condition holds.
#[derive(Debug, Clone, PartialEq)]
pub struct SmaCross {
    pub short: usize,
    pub long: usize,
}

impl Default for SmaCross {
    fn default() -> Self {
        Self { short: 5, long: 20 }
    }
}

impl SmaCross {
    pub fn warmup(&self) -> usize {
        self.short.max(self.long)
    }

    pub fn evaluate(&self, samples: &[Sample]) -> Evaluation {
        let short = last_defined(&sma(samples, self.short));
        let long = last_defined(&sma(samples, self.long));
        let mut eval = Evaluation::ready();
        record(&mut eval.readouts, "sma_short", short);
        record(&mut eval.readouts, "sma_long", long);
        eval.buy = gt(short, long);
        eval.sell = lt(short, long);
        eval.with_reason(
            format!("sma{} {} above sma{} {}", self.short, fmt_opt(short), self.long, fmt_opt(long)),
            format!("sma{} {} below sma{} {}", self.short, fmt_opt(short), self.long, fmt_opt(long)),
        )
    }
}

/// Buy below VWAP, sell above it.
#[derive(Debug, Clone, PartialEq)]
pub struct VwapRule {
    pub period: usize,
}

impl Default for VwapRule {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl VwapRule {
    pub fn warmup(&self) -> usize {
        self.period
    }

    pub(crate) fn reading(&self, samples: &[Sample]) -> Option<f64> {
        last_defined(&vwap(samples, self.period))
    }

    pub fn evaluate(&self, samples: &[Sample]) -> Evaluation {
        let value = self.reading(samples);
        let close = last_close(samples);
        let mut eval = Evaluation::ready();
        record(&mut eval.readouts, "vwap", value);
        eval.buy = lt(close, value);
        eval.sell = gt(close, value);
        eval.with_reason(
            format!("close {} below vwap {}", fmt_opt(close), fmt_opt(value)),
            format!("close {} above vwap {}", fmt_opt(close), fmt_opt(value)),
        )
    }
}

/// RSI, MACD and Bollinger readings in one pass; used by the composite tiers.
pub(crate) fn core_readings(
    samples: &[Sample],
    rsi_rule: &RsiRule,
    macd_rule: &MacdRule,
    bands: &BollingerRule,
) -> CoreReadings {
    let (macd, signal) = macd_rule.reading(samples);
    let (upper, middle, lower) = bands.reading(samples);
    CoreReadings {
        rsi: rsi_rule.reading(samples),
        macd,
        signal,
        upper,
        middle,
        lower,
    }
}
