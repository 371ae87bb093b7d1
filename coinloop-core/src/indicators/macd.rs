//! Moving Average Convergence/Divergence (MACD).
//!
//! - Line: EMA(close, fast) - EMA(close, slow)
//! - Signal: EMA(line, signal)
//! - Histogram: line - signal
//!
//! Both EMAs are seeded by the first close, so the raw recursion starts at
//! index 0. Reported values are masked before the warm-up:
//! line lookback = slow - 1, signal/histogram lookback = slow + signal - 2.

use crate::components::indicator::Indicator;
use crate::domain::Sample;

use super::{closes, ema_of_series, mask_warmup};

/// Which MACD output line to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Line,
    Signal,
    Histogram,
}

/// All three MACD outputs, aligned with the input samples.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn line_lookback(slow: usize) -> usize {
    slow.saturating_sub(1)
}

pub fn signal_lookback(slow: usize, signal: usize) -> usize {
    line_lookback(slow) + signal.saturating_sub(1)
}

/// Compute MACD line, signal line, and histogram.
pub fn macd(samples: &[Sample], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let close = closes(samples);
    let fast_ema = ema_of_series(&close, fast);
    let slow_ema = ema_of_series(&close, slow);

    let raw_line: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let raw_signal = ema_of_series(&raw_line, signal);
    let raw_hist: Vec<f64> = raw_line
        .iter()
        .zip(&raw_signal)
        .map(|(l, s)| l - s)
        .collect();

    MacdSeries {
        line: mask_warmup(raw_line, line_lookback(slow)),
        signal: mask_warmup(raw_signal, signal_lookback(slow, signal)),
        histogram: mask_warmup(raw_hist, signal_lookback(slow, signal)),
    }
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdLine,
    name: String,
}

impl Macd {
    fn build(fast: usize, slow: usize, signal: usize, output: MacdLine, label: &str) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD spans must be >= 1");
        assert!(slow > fast, "MACD slow span must be > fast span");
        Self {
            fast,
            slow,
            signal,
            output,
            name: format!("macd_{label}_{fast}_{slow}_{signal}"),
        }
    }

    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::build(fast, slow, signal, MacdLine::Line, "line")
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        Self::build(fast, slow, signal, MacdLine::Signal, "signal")
    }

    pub fn histogram(fast: usize, slow: usize, signal: usize) -> Self {
        Self::build(fast, slow, signal, MacdLine::Histogram, "histogram")
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.output {
            MacdLine::Line => line_lookback(self.slow),
            MacdLine::Signal | MacdLine::Histogram => signal_lookback(self.slow, self.signal),
        }
    }

    fn compute(&self, samples: &[Sample]) -> Vec<f64> {
        let series = macd(samples, self.fast, self.slow, self.signal);
        match self.output {
            MacdLine::Line => series.line,
            MacdLine::Signal => series.signal,
            MacdLine::Histogram => series.histogram,
        }
    }
}
