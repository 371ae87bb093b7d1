//! Background polling loop.
//!
//! Ticks a [`SharedSession`] at a fixed interval on a dedicated thread until
//! the session leaves `Running`, the tick budget is spent, or [`Poller::stop`]
//! is called. Tick errors are logged and the loop carries on.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::shared::SharedSession;
use super::TickOutcome;

/// Granularity of the interruptible sleep between ticks.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Counters collected by a finished poller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub ticks: usize,
    pub signals: usize,
    pub errors: usize,
    pub discarded: usize,
}

pub struct Poller {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<PollSummary>,
}

impl Poller {
    /// Start polling `session` every `interval`. `max_ticks` bounds the run
    /// (replay and tests); `None` polls until stopped.
    pub fn spawn(
        session: Arc<SharedSession>,
        interval: Duration,
        max_ticks: Option<usize>,
    ) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("coinloop-poller".into())
            .spawn(move || poll_loop(&session, interval, max_ticks, &flag))?;
        Ok(Self { stop, handle })
    }

    /// Ask the loop to exit after the current tick.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Wait for the loop to exit. A panicked poller thread reports an empty
    /// summary.
    pub fn join(self) -> PollSummary {
        self.handle.join().unwrap_or_else(|_| {
            warn!("poller thread panicked");
            PollSummary::default()
        })
    }
}

fn poll_loop(
    session: &SharedSession,
    interval: Duration,
    max_ticks: Option<usize>,
    stop: &AtomicBool,
) -> PollSummary {
    let mut summary = PollSummary::default();
    info!(interval_ms = interval.as_millis() as u64, "poller started");

    loop {
        if stop.load(Ordering::Relaxed) || !session.is_running() {
            break;
        }
        if max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }

        let started = Instant::now();
        summary.ticks += 1;
        match session.tick() {
            Ok(TickOutcome::Signal(signal)) => {
                summary.signals += 1;
                debug!(kind = %signal.kind, price = signal.price, "tick produced signal");
            }
            Ok(TickOutcome::NoSignal) => {}
            Ok(TickOutcome::Discarded) => summary.discarded += 1,
            Err(e) => {
                summary.errors += 1;
                warn!(error = %e, "tick failed");
            }
        }

        let deadline = started + interval;
        while !stop.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }

    info!(
        ticks = summary.ticks,
        signals = summary.signals,
        errors = summary.errors,
        "poller finished"
    );
    summary
}
