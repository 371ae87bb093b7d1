//! The session state machine.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::account::{AccountCollaborator, CandleInterval, PriceQuote};
use crate::config::CoreConfig;
use crate::domain::{Instrument, Sample, Series, Signal, SignalKind};
use crate::indicators::{last_defined, trend, volume_average, LiveIndicators};
use crate::strategy::{Evaluation, Strategy, StrategyKind, WarmupStatus};
use crate::trade_log::{TradeLog, TradeRecord};

use super::snapshot::{AnalysisSnapshot, SessionStatus, Tendency};
use super::{SessionError, SessionSettings, SessionState, StopOutcome, TickOutcome};

/// Parameters for one fetch, captured while the session is locked.
#[derive(Debug, Clone, PartialEq)]
pub struct TickRequest {
    pub generation: u64,
    pub instrument: Instrument,
    pub interval: CandleInterval,
    pub count: usize,
}

/// Data returned by the account for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketData {
    pub quote: PriceQuote,
    pub samples: Vec<Sample>,
}

/// Fetch the price and recent candles for `request`.
///
/// Touches no session state, so callers can run it without holding a lock.
pub fn fetch_market(
    account: &dyn AccountCollaborator,
    request: &TickRequest,
) -> Result<MarketData, SessionError> {
    let unavailable = |reason: String| SessionError::DataUnavailable {
        instrument: request.instrument.to_string(),
        reason,
    };
    let quote = account
        .current_price(&request.instrument)
        .map_err(|e| unavailable(e.to_string()))?;
    if !(quote.price.is_finite() && quote.price > 0.0) {
        return Err(unavailable(format!("invalid price {}", quote.price)));
    }
    let samples = account
        .series(&request.instrument, request.interval, request.count)
        .map_err(|e| unavailable(e.to_string()))?;
    Ok(MarketData { quote, samples })
}

/// Fields that only exist while a session has been started at least once.
#[derive(Debug)]
struct Active {
    kind: StrategyKind,
    strategy: Strategy,
    settings: SessionSettings,
    series: Series,
    live: LiveIndicators,
}

#[derive(Debug)]
pub struct TradingSession {
    config: CoreConfig,
    state: SessionState,
    active: Option<Active>,
    trade_count: u64,
    last_analysis: Option<AnalysisSnapshot>,
    last_signal: Option<Signal>,
    entry_price: Option<f64>,
    message: String,
    trade_log: Option<TradeLog>,
    generation: u64,
}

impl TradingSession {
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            active: None,
            trade_count: 0,
            last_analysis: None,
            last_signal: None,
            entry_price: None,
            message: "waiting".into(),
            trade_log: None,
            generation: 0,
        }
    }

    /// Append every fired signal to `log`.
    pub fn with_trade_log(mut self, log: TradeLog) -> Self {
        self.trade_log = Some(log);
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Incremented on every start and stop; stale fetches compare against it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Buffered samples of the current (or last) session.
    pub fn series(&self) -> Option<&Series> {
        self.active.as_ref().map(|a| &a.series)
    }

    pub fn start(&mut self, kind: StrategyKind, settings: SessionSettings) -> Result<(), SessionError> {
        if self.state == SessionState::Running {
            return Err(SessionError::InvalidStateTransition {
                action: "start",
                state: self.state,
            });
        }
        self.validate(&settings)?;
        let strategy = Strategy::from_kind(kind)?;
        let series_cfg = &self.config.series;
        let reachable = series_cfg.retention.min(series_cfg.fetch_count);
        if strategy.warmup() > reachable {
            return Err(SessionError::InvalidSettings(format!(
                "{kind} needs {} samples but the series keeps at most {reachable}",
                strategy.warmup()
            )));
        }
        let series = Series::new(settings.instrument.clone(), self.config.series.retention)
            .map_err(|e| SessionError::InvalidSettings(e.to_string()))?;

        info!(
            strategy = %kind,
            instrument = %settings.instrument,
            amount = settings.amount,
            "trading session started"
        );

        self.active = Some(Active {
            kind,
            strategy,
            settings,
            series,
            live: LiveIndicators::new(),
        });
        self.state = SessionState::Running;
        self.trade_count = 0;
        self.last_analysis = None;
        self.last_signal = None;
        self.entry_price = None;
        self.message = "started".into();
        self.generation += 1;
        Ok(())
    }

    fn validate(&self, settings: &SessionSettings) -> Result<(), SessionError> {
        let trade = &self.config.trade;
        let amount = settings.amount;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(SessionError::InvalidSettings(format!(
                "amount must be positive, got {amount}"
            )));
        }
        if amount < trade.min_amount || amount > trade.max_amount {
            return Err(SessionError::InvalidSettings(format!(
                "amount {amount} outside [{}, {}]",
                trade.min_amount, trade.max_amount
            )));
        }
        if !self.config.is_recognized(&settings.instrument) {
            return Err(SessionError::InvalidSettings(format!(
                "unrecognized instrument {}",
                settings.instrument
            )));
        }
        Ok(())
    }

    /// Stop a running session. A second call reports `AlreadyStopped`.
    pub fn stop(&mut self) -> Result<StopOutcome, SessionError> {
        match self.state {
            SessionState::Running => {
                self.state = SessionState::Stopped;
                self.message = "stopped".into();
                self.generation += 1;
                info!(trades = self.trade_count, "trading session stopped");
                Ok(StopOutcome::Stopped)
            }
            SessionState::Stopped => Ok(StopOutcome::AlreadyStopped),
            SessionState::Idle => Err(SessionError::InvalidStateTransition {
                action: "stop",
                state: self.state,
            }),
        }
    }

    /// Capture what the next fetch needs. Valid only while running.
    pub fn prepare_tick(&self) -> Result<TickRequest, SessionError> {
        match (&self.active, self.state) {
            (Some(active), SessionState::Running) => Ok(TickRequest {
                generation: self.generation,
                instrument: active.settings.instrument.clone(),
                interval: self.config.series.candle_interval,
                count: self.config.series.fetch_count,
            }),
            _ => Err(SessionError::InvalidStateTransition {
                action: "tick",
                state: self.state,
            }),
        }
    }

    /// Fetch, evaluate and record in one call.
    pub fn tick(&mut self, account: &dyn AccountCollaborator) -> Result<TickOutcome, SessionError> {
        let request = self.prepare_tick()?;
        let fetched = fetch_market(account, &request);
        self.apply_tick(request.generation, fetched)
    }

    /// Apply a fetch result produced for `generation`.
    ///
    /// Results from an earlier generation are discarded. A failed fetch keeps
    /// the previous snapshot and the session stays running.
    pub fn apply_tick(
        &mut self,
        generation: u64,
        fetched: Result<MarketData, SessionError>,
    ) -> Result<TickOutcome, SessionError> {
        if generation != self.generation || self.state != SessionState::Running {
            debug!(generation, current = self.generation, "discarding stale tick");
            return Ok(TickOutcome::Discarded);
        }

        let data = match fetched {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "tick skipped");
                self.message = format!("analysis failed: {e}");
                return Err(e);
            }
        };

        let Some(active) = self.active.as_mut() else {
            return Err(SessionError::InvalidStateTransition {
                action: "tick",
                state: self.state,
            });
        };

        let appended = active.series.merge(&data.samples);
        for sample in &appended {
            active.live.push(sample);
        }

        let samples = active.series.samples();
        let evaluation = active.strategy.evaluate(samples);
        let price = data.quote.price;
        let band = self.config.target_band_pct(active.kind) / 100.0;

        self.last_analysis = Some(AnalysisSnapshot {
            analyzed_at: Utc::now(),
            current_price: price,
            change_rate_24h: data.quote.change_rate_24h,
            volume_24h: data.quote.volume_24h,
            target_buy: price * (1.0 - band),
            target_sell: price * (1.0 + band),
            samples: samples.len(),
            warmup: evaluation.warmup,
            readouts: evaluation.readouts.clone(),
            live: active.live.readings(),
            phase: evaluation.phase,
            price_trend: Tendency::from_delta(last_defined(&trend(samples, 20))),
            volume_trend: Tendency::from_delta(
                samples
                    .last()
                    .zip(last_defined(&volume_average(samples, 20)))
                    .map(|(s, avg)| s.volume - avg),
            ),
        });

        let timestamp = samples.last().map_or_else(Utc::now, |s| s.timestamp);
        let Some((kind, reason)) = self.decide(price, &evaluation) else {
            self.message = match evaluation.warmup {
                WarmupStatus::Insufficient {
                    required,
                    available,
                } => format!("warming up ({available}/{required} samples)"),
                WarmupStatus::Ready => "waiting for signal".into(),
            };
            return Ok(TickOutcome::NoSignal);
        };

        let signal = match kind {
            SignalKind::Buy => Signal::buy(price, reason, timestamp),
            SignalKind::Sell => Signal::sell(price, reason, timestamp),
        };
        self.record(&signal);
        Ok(TickOutcome::Signal(signal))
    }

    /// Protective exits first, then the strategy's own decision.
    fn decide(&self, price: f64, evaluation: &Evaluation) -> Option<(SignalKind, String)> {
        if let Some(entry) = self.entry_price {
            let change_pct = (price - entry) / entry * 100.0;
            if let Some(sl) = self.config.stop_loss_pct() {
                if change_pct <= -sl {
                    return Some((SignalKind::Sell, format!("stop-loss at {change_pct:+.2}%")));
                }
            }
            if let Some(tp) = self.config.take_profit_pct() {
                if change_pct >= tp {
                    return Some((SignalKind::Sell, format!("take-profit at {change_pct:+.2}%")));
                }
            }
        }

        let kind = evaluation.decision()?;
        let reason = evaluation
            .reason
            .clone()
            .unwrap_or_else(|| format!("{} signal", kind.as_str().to_lowercase()));
        Some((kind, reason))
    }

    fn record(&mut self, signal: &Signal) {
        let Some(active) = self.active.as_ref() else {
            return;
        };

        match signal.kind {
            SignalKind::Buy => {
                if self.entry_price.is_none() {
                    self.entry_price = Some(signal.price);
                }
            }
            SignalKind::Sell => self.entry_price = None,
        }
        self.trade_count += 1;
        self.message = format!("{} signal: {}", signal.kind, signal.reason);

        info!(
            strategy = %active.kind,
            instrument = %active.settings.instrument,
            kind = %signal.kind,
            price = signal.price,
            reason = %signal.reason,
            "signal fired"
        );

        if let Some(log) = self.trade_log.as_mut() {
            let record = TradeRecord {
                timestamp: signal.timestamp,
                kind: signal.kind,
                instrument: active.settings.instrument.clone(),
                price: signal.price,
                amount: active.settings.amount,
            };
            if let Err(e) = log.append(&record) {
                warn!(error = %e, "failed to append trade log");
            }
        }
        self.last_signal = Some(signal.clone());
    }

    /// `(current - entry) / entry * 100`, `None` while flat.
    pub fn profit_rate_pct(&self, current_price: f64) -> Option<f64> {
        self.entry_price
            .filter(|entry| *entry > 0.0)
            .map(|entry| (current_price - entry) / entry * 100.0)
    }

    pub fn status(&self) -> SessionStatus {
        let profit_rate_pct = self
            .last_analysis
            .as_ref()
            .and_then(|a| self.profit_rate_pct(a.current_price));
        SessionStatus {
            state: self.state,
            strategy: self.active.as_ref().map(|a| a.kind),
            instrument: self.active.as_ref().map(|a| a.settings.instrument.clone()),
            amount: self.active.as_ref().map(|a| a.settings.amount),
            trade_count: self.trade_count,
            last_analysis: self.last_analysis.clone(),
            last_signal: self.last_signal.clone(),
            entry_price: self.entry_price,
            profit_rate_pct,
            message: self.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::ReplayAccount;
    use crate::indicators::make_samples;

    fn config_with(code: &str) -> CoreConfig {
        let mut config = CoreConfig::default();
        config
            .instruments
            .insert("test".into(), vec![Instrument::parse(code).unwrap()]);
        config
    }

    fn settings(code: &str, amount: f64) -> SessionSettings {
        SessionSettings::new(Instrument::parse(code).unwrap(), amount)
    }

    #[test]
    fn start_validates_settings() {
        let mut session = TradingSession::new(config_with("X"));
        for bad in [0.0, -5.0, f64::NAN, 1.0, 5_000_000.0] {
            let err = session.start(StrategyKind::Rsi, settings("X", bad)).unwrap_err();
            assert!(matches!(err, SessionError::InvalidSettings(_)), "{bad}");
        }
        let err = session
            .start(StrategyKind::Rsi, settings("KRW-NOPE", 100_000.0))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidSettings(_)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn unimplemented_strategy_rejected() {
        let mut session = TradingSession::new(config_with("X"));
        let err = session
            .start(StrategyKind::Ichimoku, settings("X", 100_000.0))
            .unwrap_err();
        assert!(matches!(err, SessionError::UnimplementedStrategy(_)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn start_rejects_retention_below_warmup() {
        let mut config = config_with("X");
        config.series.retention = 100;
        let mut session = TradingSession::new(config.clone());
        let err = session
            .start(StrategyKind::AiFull, settings("X", 100_000.0))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidSettings(ref m) if m.contains("120")));
        assert_eq!(session.state(), SessionState::Idle);
        // shorter warm-ups still fit
        session.start(StrategyKind::Rsi, settings("X", 100_000.0)).unwrap();

        config.series.retention = 200;
        config.series.fetch_count = 50;
        let mut session = TradingSession::new(config);
        assert!(matches!(
            session.start(StrategyKind::AiFull, settings("X", 100_000.0)),
            Err(SessionError::InvalidSettings(_))
        ));
    }

    #[test]
    fn stop_from_idle_is_invalid() {
        let mut session = TradingSession::new(CoreConfig::default());
        assert!(matches!(
            session.stop(),
            Err(SessionError::InvalidStateTransition { action: "stop", .. })
        ));
    }

    #[test]
    fn tick_requires_running() {
        let mut session = TradingSession::new(config_with("X"));
        let account = ReplayAccount::new(Instrument::parse("X").unwrap(), Vec::new());
        assert!(matches!(
            session.tick(&account),
            Err(SessionError::InvalidStateTransition { action: "tick", .. })
        ));
    }

    #[test]
    fn stale_generation_is_discarded() {
        let mut session = TradingSession::new(config_with("X"));
        session.start(StrategyKind::Sma, settings("X", 100_000.0)).unwrap();
        let request = session.prepare_tick().unwrap();
        session.stop().unwrap();
        session.start(StrategyKind::Sma, settings("X", 100_000.0)).unwrap();

        let data = MarketData {
            quote: PriceQuote {
                price: 100.0,
                change_rate_24h: 0.0,
                volume_24h: 0.0,
            },
            samples: make_samples(&[100.0]),
        };
        let outcome = session.apply_tick(request.generation, Ok(data)).unwrap();
        assert_eq!(outcome, TickOutcome::Discarded);
        assert!(session.status().last_analysis.is_none());
    }

    #[test]
    fn stop_loss_exits_before_strategy() {
        let mut config = config_with("X");
        config.trade.risk_level = crate::config::RiskLevel::Low;
        let mut session = TradingSession::new(config);
        session.start(StrategyKind::Sma, settings("X", 100_000.0)).unwrap();

        // rising series: SMA buys and records the entry price
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let samples = make_samples(&closes);
        let quote = |price| PriceQuote {
            price,
            change_rate_24h: 0.0,
            volume_24h: 0.0,
        };
        let gen = session.generation();
        let first = session
            .apply_tick(gen, Ok(MarketData { quote: quote(124.0), samples: samples.clone() }))
            .unwrap();
        assert_eq!(first.signal().map(|s| s.kind), Some(SignalKind::Buy));
        assert_eq!(session.status().entry_price, Some(124.0));

        // price drops 2.5%: below the LOW tier's 2% stop-loss
        let second = session
            .apply_tick(gen, Ok(MarketData { quote: quote(120.9), samples }))
            .unwrap();
        let signal = second.signal().unwrap();
        assert_eq!(signal.kind, SignalKind::Sell);
        assert!(signal.reason.starts_with("stop-loss"));
        let status = session.status();
        assert_eq!(status.entry_price, None);
        assert_eq!(status.trade_count, 2);
    }

    #[test]
    fn profit_rate_tracks_entry() {
        let mut session = TradingSession::new(config_with("X"));
        assert_eq!(session.profit_rate_pct(110.0), None);
        session.entry_price = Some(100.0);
        assert_eq!(session.profit_rate_pct(110.0), Some(10.0));
    }
}
