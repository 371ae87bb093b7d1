//! Synthetic account: seeded random-walk market for demos and tests.
//!
//! Clearly fake data: each price query appends one new candle drawn from a
//! bounded random walk. The same seed always produces the same market.

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{Instrument, Sample};

use super::{quote_from_history, AccountCollaborator, AccountError, Balance, CandleInterval, PriceQuote};

const MAX_HISTORY: usize = 2_000;

#[derive(Debug)]
struct WalkState {
    rng: StdRng,
    history: Vec<Sample>,
    price: f64,
    next_time: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SyntheticAccount {
    interval: CandleInterval,
    state: Mutex<WalkState>,
    balance: Balance,
}

impl SyntheticAccount {
    /// Start a walk at `start_price` with `history` candles already generated.
    pub fn new(seed: u64, start_price: f64, history: usize, interval: CandleInterval) -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let mut state = WalkState {
            rng: StdRng::seed_from_u64(seed),
            history: Vec::with_capacity(history.min(MAX_HISTORY)),
            price: start_price,
            next_time: start,
        };
        for _ in 0..history {
            step(&mut state, interval);
        }
        Self {
            interval,
            state: Mutex::new(state),
            balance: Balance {
                quote_balance: 1_000_000.0,
                base_balance: 0.0,
            },
        }
    }

    pub fn with_balance(mut self, balance: Balance) -> Self {
        self.balance = balance;
        self
    }

    pub fn interval(&self) -> CandleInterval {
        self.interval
    }
}

/// Append one candle: return in [-1.5%, 1.5%), wicks up to 0.5%.
fn step(state: &mut WalkState, interval: CandleInterval) {
    let ret: f64 = state.rng.gen_range(-0.015..0.015);
    let open = state.price;
    let close = (open * (1.0 + ret)).max(f64::MIN_POSITIVE);
    let high = open.max(close) * (1.0 + state.rng.gen_range(0.0..0.005));
    let low = open.min(close) * (1.0 - state.rng.gen_range(0.0..0.005));
    let volume = state.rng.gen_range(1.0..100.0);

    state.history.push(Sample::new(state.next_time, open, high, low, close, volume));
    if state.history.len() > MAX_HISTORY {
        let excess = state.history.len() - MAX_HISTORY;
        state.history.drain(..excess);
    }
    state.price = close;
    state.next_time += interval.duration();
}

impl AccountCollaborator for SyntheticAccount {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn current_price(&self, instrument: &Instrument) -> Result<PriceQuote, AccountError> {
        let mut state = self.state.lock();
        step(&mut state, self.interval);
        quote_from_history(&state.history).ok_or_else(|| AccountError::PriceUnavailable {
            instrument: instrument.to_string(),
            reason: "empty walk".into(),
        })
    }

    fn series(
        &self,
        _instrument: &Instrument,
        _interval: CandleInterval,
        count: usize,
    ) -> Result<Vec<Sample>, AccountError> {
        let state = self.state.lock();
        let start = state.history.len().saturating_sub(count);
        Ok(state.history[start..].to_vec())
    }

    fn balance(&self, _instrument: &Instrument) -> Result<Balance, AccountError> {
        Ok(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst() -> Instrument {
        Instrument::parse("KRW-BTC").unwrap()
    }

    #[test]
    fn walk_is_deterministic() {
        let a = SyntheticAccount::new(7, 50_000.0, 50, CandleInterval::Minute1);
        let b = SyntheticAccount::new(7, 50_000.0, 50, CandleInterval::Minute1);
        let sa = a.series(&inst(), CandleInterval::Minute1, 50).unwrap();
        let sb = b.series(&inst(), CandleInterval::Minute1, 50).unwrap();
        assert_eq!(sa, sb);
        assert_eq!(
            a.current_price(&inst()).unwrap(),
            b.current_price(&inst()).unwrap()
        );
    }

    #[test]
    fn candles_are_well_formed_and_ordered() {
        let account = SyntheticAccount::new(42, 100.0, 300, CandleInterval::Minute5);
        let samples = account.series(&inst(), CandleInterval::Minute5, 300).unwrap();
        assert_eq!(samples.len(), 300);
        assert!(samples.iter().all(Sample::is_well_formed));
        assert!(samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(samples.windows(2).all(|w| w[0].close == w[1].open));
    }

    #[test]
    fn each_quote_appends_a_candle() {
        let account = SyntheticAccount::new(1, 100.0, 10, CandleInterval::Minute1);
        let quote = account.current_price(&inst()).unwrap();
        let series = account.series(&inst(), CandleInterval::Minute1, 100).unwrap();
        assert_eq!(series.len(), 11);
        assert_eq!(series.last().map(|s| s.close), Some(quote.price));
    }
}
