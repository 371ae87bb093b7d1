//! Thread-safe handle around a [`TradingSession`].
//!
//! Control commands (`start`, `stop`, `status`) may arrive from another
//! thread while the polling loop ticks. The session lock is never held
//! across the network fetch, so a `stop` issued mid-fetch is applied
//! immediately and the late result is discarded by generation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::account::AccountCollaborator;
use crate::strategy::StrategyKind;

use super::snapshot::SessionStatus;
use super::state::{fetch_market, TradingSession};
use super::{SessionError, SessionSettings, StopOutcome, TickOutcome};

pub struct SharedSession {
    inner: Mutex<TradingSession>,
    account: Arc<dyn AccountCollaborator>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on every exit path.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SharedSession {
    pub fn new(session: TradingSession, account: Arc<dyn AccountCollaborator>) -> Self {
        Self {
            inner: Mutex::new(session),
            account,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn start(&self, kind: StrategyKind, settings: SessionSettings) -> Result<(), SessionError> {
        self.inner.lock().start(kind, settings)
    }

    pub fn stop(&self) -> Result<StopOutcome, SessionError> {
        self.inner.lock().stop()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.lock().status()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().is_running()
    }

    /// Run `f` with the session locked.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut TradingSession) -> R) -> R {
        f(&mut *self.inner.lock())
    }

    /// One evaluation cycle. At most one tick runs at a time; a concurrent
    /// call gets `TickInProgress`.
    pub fn tick(&self) -> Result<TickOutcome, SessionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SessionError::TickInProgress);
        }
        let _guard = InFlight(&self.in_flight);

        let request = self.inner.lock().prepare_tick()?;
        let fetched = fetch_market(self.account.as_ref(), &request);
        self.inner.lock().apply_tick(request.generation, fetched)
    }
}

impl std::fmt::Debug for SharedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSession")
            .field("account", &self.account.name())
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
