//! Trading session: one strategy on one instrument, driven tick by tick.
//!
//! States: `Idle -> Running -> Stopped`, and `Stopped -> Running` on a new
//! `start`. All errors here are recoverable at the session boundary; none
//! of them should end the polling loop.

pub mod poller;
pub mod shared;
pub mod snapshot;
pub mod state;

pub use poller::{PollSummary, Poller};
pub use shared::SharedSession;
pub use snapshot::{AnalysisSnapshot, SessionStatus, Tendency};
pub use state::{fetch_market, MarketData, TickRequest, TradingSession};

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{Instrument, Signal};
use crate::strategy::StrategyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Price or series fetch failed. The tick was skipped and the session
    /// keeps running with its previous snapshot.
    #[error("data unavailable for {instrument}: {reason}")]
    DataUnavailable { instrument: String, reason: String },

    /// Rejected start parameters. State is unchanged.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("cannot {action} a session that is {state}")]
    InvalidStateTransition {
        action: &'static str,
        state: SessionState,
    },

    #[error(transparent)]
    UnimplementedStrategy(#[from] StrategyError),

    /// A tick was requested while another one is still fetching.
    #[error("a tick is already in progress")]
    TickInProgress,
}

/// Parameters for `start`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSettings {
    pub instrument: Instrument,
    pub amount: f64,
}

impl SessionSettings {
    pub fn new(instrument: Instrument, amount: f64) -> Self {
        Self { instrument, amount }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    AlreadyStopped,
}

/// Result of one evaluation cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The strategy was evaluated and nothing fired.
    NoSignal,
    Signal(Signal),
    /// The session was stopped or restarted while the fetch was in flight;
    /// the fetched data was thrown away.
    Discarded,
}

impl TickOutcome {
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Self::Signal(s) => Some(s),
            _ => None,
        }
    }
}
