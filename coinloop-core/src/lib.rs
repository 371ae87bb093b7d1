//! Coinloop Core: indicators, strategies and the trading session for a
//! crypto polling loop.
//!
//! This crate contains:
//! - Domain types (samples, bounded series, instruments, signals)
//! - Batch indicators and their incremental counterparts
//! - Rule strategies and the tiered AI strategy family
//! - The trading session state machine and its polling loop
//! - Account collaborators (replay from CSV, synthetic random walk)
//! - Configuration, credential storage and the trade log

pub mod account;
pub mod components;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod indicators;
pub mod session;
pub mod strategy;
pub mod trade_log;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared with the poller thread are
    /// Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Sample>();
        require_sync::<domain::Sample>();
        require_send::<domain::Series>();
        require_sync::<domain::Series>();
        require_send::<domain::Instrument>();
        require_sync::<domain::Instrument>();
        require_send::<domain::Signal>();
        require_sync::<domain::Signal>();

        // Indicators and strategies
        require_send::<components::IndicatorValues>();
        require_sync::<components::IndicatorValues>();
        require_send::<indicators::LiveIndicators>();
        require_sync::<indicators::LiveIndicators>();
        require_send::<strategy::Strategy>();
        require_sync::<strategy::Strategy>();
        require_send::<strategy::Evaluation>();
        require_sync::<strategy::Evaluation>();

        // Session
        require_send::<session::TradingSession>();
        require_send::<session::SharedSession>();
        require_sync::<session::SharedSession>();
        require_send::<session::SessionStatus>();
        require_sync::<session::SessionStatus>();

        // Accounts and storage
        require_send::<account::ReplayAccount>();
        require_sync::<account::ReplayAccount>();
        require_send::<account::SyntheticAccount>();
        require_sync::<account::SyntheticAccount>();
        require_send::<config::CoreConfig>();
        require_sync::<config::CoreConfig>();
        require_send::<credentials::ApiKeys>();
        require_sync::<credentials::ApiKeys>();
    }

    /// Architecture contract: strategies see samples only, never the account
    /// or session state.
    #[test]
    fn strategy_evaluation_takes_samples_only() {
        fn _check(strategy: &strategy::Strategy, samples: &[domain::Sample]) -> strategy::Evaluation {
            strategy.evaluate(samples)
        }
    }
}
