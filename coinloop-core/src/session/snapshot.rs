//! Analysis snapshot and read-only session status.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Instrument, Signal};
use crate::indicators::{LiveReadings, MarketPhase};
use crate::strategy::{StrategyKind, WarmupStatus};

use super::SessionState;

/// Direction of a short-term tendency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tendency {
    Rising,
    Falling,
    Flat,
}

impl Tendency {
    pub fn from_delta(delta: Option<f64>) -> Option<Self> {
        delta.map(|d| {
            if d > 0.0 {
                Self::Rising
            } else if d < 0.0 {
                Self::Falling
            } else {
                Self::Flat
            }
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Flat => "flat",
        }
    }
}

/// What the last evaluation cycle saw. Overwritten every cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSnapshot {
    pub analyzed_at: DateTime<Utc>,
    pub current_price: f64,
    pub change_rate_24h: f64,
    pub volume_24h: f64,
    pub target_buy: f64,
    pub target_sell: f64,
    pub samples: usize,
    pub warmup: WarmupStatus,
    /// Readouts of the active strategy.
    pub readouts: BTreeMap<String, f64>,
    /// Standard indicator set maintained incrementally.
    pub live: LiveReadings,
    pub phase: Option<MarketPhase>,
    pub price_trend: Option<Tendency>,
    pub volume_trend: Option<Tendency>,
}

/// Read-only projection of a trading session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub strategy: Option<StrategyKind>,
    pub instrument: Option<Instrument>,
    pub amount: Option<f64>,
    pub trade_count: u64,
    pub last_analysis: Option<AnalysisSnapshot>,
    pub last_signal: Option<Signal>,
    pub entry_price: Option<f64>,
    pub profit_rate_pct: Option<f64>,
    pub message: String,
}

fn opt_line(out: &mut String, label: &str, value: Option<f64>) {
    if let Some(v) = value {
        let _ = writeln!(out, "  {label:<14} {v:.2}");
    }
}

impl SessionStatus {
    /// Multi-line text report for terminals and log files.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "status: {} ({})", self.state, self.message);

        if self.state == SessionState::Idle && self.strategy.is_none() {
            out.push_str("no session has been started\n");
            return out;
        }

        if let Some(inst) = &self.instrument {
            let _ = writeln!(out, "instrument: {inst}");
        }

        if let Some(a) = &self.last_analysis {
            out.push_str("\nplan:\n");
            let _ = writeln!(out, "  {:<14} {:.2}", "price", a.current_price);
            let _ = writeln!(out, "  {:<14} {:+.2}%", "24h change", a.change_rate_24h * 100.0);
            let _ = writeln!(out, "  {:<14} {:.0}", "target buy", a.target_buy);
            let _ = writeln!(out, "  {:<14} {:.0}", "target sell", a.target_sell);

            out.push_str("\nanalysis:\n");
            if let WarmupStatus::Insufficient {
                required,
                available,
            } = a.warmup
            {
                let _ = writeln!(out, "  warming up ({available}/{required} samples)");
            }
            for (name, value) in &a.readouts {
                let _ = writeln!(out, "  {name:<14} {value:.2}");
            }
            if a.readouts.is_empty() {
                for (name, value) in a.live.named() {
                    let _ = writeln!(out, "  {name:<14} {value:.2}");
                }
            }
            if let Some(phase) = a.phase {
                let _ = writeln!(out, "  {:<14} {phase}", "phase");
            }
            if let Some(t) = a.volume_trend {
                let _ = writeln!(out, "  {:<14} {}", "volume trend", t.label());
            }
            if let Some(t) = a.price_trend {
                let _ = writeln!(out, "  {:<14} {}", "price trend", t.label());
            }
        }

        if let Some(s) = &self.last_signal {
            out.push_str("\nlast signal:\n");
            let _ = writeln!(out, "  {:<14} {}", "type", s.kind);
            let _ = writeln!(out, "  {:<14} {:.2}", "price", s.price);
            let _ = writeln!(out, "  {:<14} {}", "reason", s.reason);
        }

        out.push_str("\nsettings:\n");
        if let Some(kind) = self.strategy {
            let _ = writeln!(out, "  {:<14} {kind}", "strategy");
        }
        if let Some(amount) = self.amount {
            let _ = writeln!(out, "  {:<14} {amount:.0}", "amount");
        }
        let _ = writeln!(out, "  {:<14} {}", "trades", self.trade_count);
        opt_line(&mut out, "entry price", self.entry_price);
        if let Some(p) = self.profit_rate_pct {
            let _ = writeln!(out, "  {:<14} {p:+.2}%", "profit");
        }
        out
    }
}
