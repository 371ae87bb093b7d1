//! Incremental indicator state for live sessions.
//!
//! Each state consumes one value (or sample) at a time and agrees with the
//! batch functions in this crate on the same input, up to float rounding.
//! Updates are O(1) amortized.

use std::collections::VecDeque;

use serde::Serialize;

use crate::domain::Sample;

use super::ema::alpha;
use super::macd::{line_lookback, signal_lookback};
use super::rsi::rsi_from_averages;
use super::stochastic::percent_k;

/// Fixed-size rolling window with running sum and sum of squares.
///
/// A NaN inside the window makes every statistic undefined until it is
/// pushed out, matching the batch rolling functions.
#[derive(Debug, Clone)]
pub struct RollingStats {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
    nan_count: usize,
}

impl RollingStats {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "rolling period must be >= 1");
        Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            sum: 0.0,
            sum_sq: 0.0,
            nan_count: 0,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.window.push_back(value);
        if value.is_nan() {
            self.nan_count += 1;
        } else {
            self.sum += value;
            self.sum_sq += value * value;
        }

        if self.window.len() > self.period {
            if let Some(old) = self.window.pop_front() {
                if old.is_nan() {
                    self.nan_count -= 1;
                } else {
                    self.sum -= old;
                    self.sum_sq -= old * old;
                }
            }
        }
    }

    pub fn is_full(&self) -> bool {
        self.window.len() == self.period
    }

    fn ready(&self) -> bool {
        self.is_full() && self.nan_count == 0
    }

    pub fn sum(&self) -> Option<f64> {
        self.ready().then_some(self.sum)
    }

    pub fn mean(&self) -> Option<f64> {
        self.sum().map(|s| s / self.period as f64)
    }

    /// Population standard deviation.
    pub fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let variance = (self.sum_sq / self.period as f64 - mean * mean).max(0.0);
        Some(variance.sqrt())
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.sum = 0.0;
        self.sum_sq = 0.0;
        self.nan_count = 0;
    }
}

/// Rolling max/min over a fixed window, using monotonic deques.
#[derive(Debug, Clone)]
pub struct RollingExtrema {
    period: usize,
    seen: usize,
    highs: VecDeque<(usize, f64)>,
    lows: VecDeque<(usize, f64)>,
}

impl RollingExtrema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "rolling period must be >= 1");
        Self {
            period,
            seen: 0,
            highs: VecDeque::new(),
            lows: VecDeque::new(),
        }
    }

    pub fn push(&mut self, high: f64, low: f64) {
        let idx = self.seen;
        self.seen += 1;

        while self.highs.back().is_some_and(|&(_, h)| h <= high) {
            self.highs.pop_back();
        }
        self.highs.push_back((idx, high));
        while self.lows.back().is_some_and(|&(_, l)| l >= low) {
            self.lows.pop_back();
        }
        self.lows.push_back((idx, low));

        let oldest = self.seen.saturating_sub(self.period);
        while self.highs.front().is_some_and(|&(i, _)| i < oldest) {
            self.highs.pop_front();
        }
        while self.lows.front().is_some_and(|&(i, _)| i < oldest) {
            self.lows.pop_front();
        }
    }

    /// `(highest, lowest)` once the window is full.
    pub fn range(&self) -> Option<(f64, f64)> {
        if self.seen < self.period {
            return None;
        }
        Some((self.highs.front()?.1, self.lows.front()?.1))
    }
}

/// Recursive EMA seeded by the first value.
#[derive(Debug, Clone)]
pub struct EmaState {
    alpha: f64,
    value: Option<f64>,
}

impl EmaState {
    pub fn new(span: usize) -> Self {
        Self {
            alpha: alpha(span),
            value: None,
        }
    }

    pub fn push(&mut self, x: f64) -> f64 {
        let next = match self.value {
            None => x,
            Some(prev) => self.alpha * x + (1.0 - self.alpha) * prev,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// RSI from simple rolling means of gains and losses.
#[derive(Debug, Clone)]
pub struct RsiState {
    prev_close: Option<f64>,
    gains: RollingStats,
    losses: RollingStats,
}

impl RsiState {
    pub fn new(period: usize) -> Self {
        Self {
            prev_close: None,
            gains: RollingStats::new(period),
            losses: RollingStats::new(period),
        }
    }

    pub fn push(&mut self, close: f64) {
        if let Some(prev) = self.prev_close {
            let change = close - prev;
            self.gains.push(change.max(0.0));
            self.losses.push((-change).max(0.0));
        }
        self.prev_close = Some(close);
    }

    pub fn value(&self) -> Option<f64> {
        Some(rsi_from_averages(self.gains.mean()?, self.losses.mean()?))
    }
}

#[derive(Debug, Clone)]
pub struct MacdState {
    fast: EmaState,
    slow: EmaState,
    signal: EmaState,
    line_lookback: usize,
    signal_lookback: usize,
    count: usize,
    last: Option<(f64, f64)>,
}

impl MacdState {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            fast: EmaState::new(fast),
            slow: EmaState::new(slow),
            signal: EmaState::new(signal),
            line_lookback: line_lookback(slow),
            signal_lookback: signal_lookback(slow, signal),
            count: 0,
            last: None,
        }
    }

    pub fn push(&mut self, close: f64) {
        let line = self.fast.push(close) - self.slow.push(close);
        let signal = self.signal.push(line);
        self.last = Some((line, signal));
        self.count += 1;
    }

    pub fn line(&self) -> Option<f64> {
        let (line, _) = self.last?;
        (self.count > self.line_lookback).then_some(line)
    }

    pub fn signal(&self) -> Option<f64> {
        let (_, signal) = self.last?;
        (self.count > self.signal_lookback).then_some(signal)
    }

    pub fn histogram(&self) -> Option<f64> {
        Some(self.line()? - self.signal()?)
    }
}

/// Latest values of the live indicator set. `None` while warming up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LiveReadings {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub vwap: Option<f64>,
    pub momentum: Option<f64>,
}

impl LiveReadings {
    /// Defined readings keyed by the names used in analysis snapshots.
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        [
            ("rsi", self.rsi),
            ("macd", self.macd),
            ("macd_signal", self.macd_signal),
            ("macd_histogram", self.macd_histogram),
            ("bb_upper", self.bb_upper),
            ("bb_middle", self.bb_middle),
            ("bb_lower", self.bb_lower),
            ("stoch_k", self.stoch_k),
            ("stoch_d", self.stoch_d),
            ("sma_short", self.sma_short),
            ("sma_long", self.sma_long),
            ("vwap", self.vwap),
            ("momentum", self.momentum),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.map(|v| (name, v)))
        .collect()
    }
}

/// The standard indicator set maintained one sample at a time.
///
/// Periods: RSI 14, MACD 12/26/9, Bollinger 20x2, Stochastic 14/3,
/// SMA 5 and 20, VWAP 14, momentum 14.
#[derive(Debug, Clone)]
pub struct LiveIndicators {
    rsi: RsiState,
    macd: MacdState,
    bands: RollingStats,
    band_mult: f64,
    extrema: RollingExtrema,
    stoch_d: RollingStats,
    last_k: Option<f64>,
    sma_short: RollingStats,
    turnover: RollingStats,
    volume: RollingStats,
    closes: VecDeque<f64>,
    momentum_period: usize,
    count: usize,
}

impl Default for LiveIndicators {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveIndicators {
    pub fn new() -> Self {
        Self {
            rsi: RsiState::new(14),
            macd: MacdState::new(12, 26, 9),
            bands: RollingStats::new(20),
            band_mult: 2.0,
            extrema: RollingExtrema::new(14),
            stoch_d: RollingStats::new(3),
            last_k: None,
            sma_short: RollingStats::new(5),
            turnover: RollingStats::new(14),
            volume: RollingStats::new(14),
            closes: VecDeque::with_capacity(16),
            momentum_period: 14,
            count: 0,
        }
    }

    pub fn from_samples(samples: &[Sample]) -> Self {
        let mut live = Self::new();
        for sample in samples {
            live.push(sample);
        }
        live
    }

    /// Number of samples consumed.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn push(&mut self, sample: &Sample) {
        let close = sample.close;
        self.count += 1;

        self.rsi.push(close);
        self.macd.push(close);
        self.bands.push(close);
        self.sma_short.push(close);

        self.extrema.push(sample.high, sample.low);
        self.last_k = self
            .extrema
            .range()
            .and_then(|(highest, lowest)| percent_k(close, lowest, highest));
        if self.extrema.range().is_some() {
            self.stoch_d.push(self.last_k.unwrap_or(f64::NAN));
        }

        self.turnover.push(sample.turnover());
        self.volume.push(sample.volume);

        self.closes.push_back(close);
        if self.closes.len() > self.momentum_period + 1 {
            self.closes.pop_front();
        }
    }

    pub fn readings(&self) -> LiveReadings {
        let middle = self.bands.mean();
        let width = self.bands.std_dev().map(|s| s * self.band_mult);

        let vwap = match (self.turnover.sum(), self.volume.sum()) {
            (Some(pv), Some(v)) if v > 0.0 => Some(pv / v),
            _ => None,
        };

        let momentum = if self.closes.len() == self.momentum_period + 1 {
            match (self.closes.front(), self.closes.back()) {
                (Some(&base), Some(&last)) if base != 0.0 => Some((last - base) / base * 100.0),
                _ => None,
            }
        } else {
            None
        };

        LiveReadings {
            rsi: self.rsi.value(),
            macd: self.macd.line(),
            macd_signal: self.macd.signal(),
            macd_histogram: self.macd.histogram(),
            bb_upper: middle.zip(width).map(|(m, w)| m + w),
            bb_middle: middle,
            bb_lower: middle.zip(width).map(|(m, w)| m - w),
            stoch_k: self.last_k,
            stoch_d: self.stoch_d.mean(),
            sma_short: self.sma_short.mean(),
            sma_long: middle,
            vwap,
            momentum,
        }
    }
}
