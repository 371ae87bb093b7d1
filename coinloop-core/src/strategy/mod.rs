//! Strategy engine: closed set of decision rules over a sample series.
//!
//! A [`Strategy`] is a tagged union over the implemented [`StrategyKind`]s.
//! Predicates are pure: they read the series, never mutate it, and answer
//! `false` while the series is shorter than the strategy's warm-up.

pub mod ai;
pub mod kind;
pub mod rules;

pub use ai::{AiAdvanced, AiBasic, AiFull, Confidence, FullVerdict, TierVerdict};
pub use kind::{StrategyKind, UnknownStrategy};
pub use rules::{BollingerRule, MacdRule, RsiRule, SmaCross, StochasticRule, VwapRule};

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{Sample, SignalKind};
use crate::indicators::MarketPhase;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("strategy {0} has no decision rule")]
    Unimplemented(StrategyKind),
}

/// Whether the series was long enough to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarmupStatus {
    Ready,
    Insufficient { required: usize, available: usize },
}

/// Result of evaluating a strategy over the current series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub buy: bool,
    pub sell: bool,
    pub warmup: WarmupStatus,
    /// Indicator readouts for display, keyed by name. Undefined values are
    /// left out.
    pub readouts: BTreeMap<String, f64>,
    /// Human-readable reason for the side that fired (buy first).
    pub reason: Option<String>,
    pub phase: Option<MarketPhase>,
    pub confidence: Option<(Confidence, Confidence)>,
}

impl Evaluation {
    pub(crate) fn ready() -> Self {
        Self {
            buy: false,
            sell: false,
            warmup: WarmupStatus::Ready,
            readouts: BTreeMap::new(),
            reason: None,
            phase: None,
            confidence: None,
        }
    }

    fn insufficient(required: usize, available: usize) -> Self {
        Self {
            warmup: WarmupStatus::Insufficient {
                required,
                available,
            },
            ..Self::ready()
        }
    }

    pub(crate) fn with_reason(mut self, buy: String, sell: String) -> Self {
        self.reason = if self.buy {
            Some(buy)
        } else if self.sell {
            Some(sell)
        } else {
            None
        };
        self
    }

    pub fn is_ready(&self) -> bool {
        self.warmup == WarmupStatus::Ready
    }

    /// The signal this evaluation asks for. Buy wins a tie.
    pub fn decision(&self) -> Option<SignalKind> {
        if self.buy {
            Some(SignalKind::Buy)
        } else if self.sell {
            Some(SignalKind::Sell)
        } else {
            None
        }
    }
}

/// An implemented strategy with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Rsi(RsiRule),
    Macd(MacdRule),
    Bollinger(BollingerRule),
    Stochastic(StochasticRule),
    Sma(SmaCross),
    Vwap(VwapRule),
    AiBasic(AiBasic),
    AiAdvanced(AiBasic, AiAdvanced),
    AiFull(AiBasic, AiAdvanced, AiFull),
}

impl Strategy {
    /// Build the default-parameter strategy for `kind`.
    pub fn from_kind(kind: StrategyKind) -> Result<Self, StrategyError> {
        let strategy = match kind {
            StrategyKind::Rsi => Self::Rsi(RsiRule::default()),
            StrategyKind::Macd => Self::Macd(MacdRule::default()),
            StrategyKind::Bollinger => Self::Bollinger(BollingerRule::default()),
            StrategyKind::Stochastic => Self::Stochastic(StochasticRule::default()),
            StrategyKind::Sma => Self::Sma(SmaCross::default()),
            StrategyKind::Vwap => Self::Vwap(VwapRule::default()),
            StrategyKind::AiBasic => Self::AiBasic(AiBasic::default()),
            StrategyKind::AiAdvanced => Self::AiAdvanced(AiBasic::default(), AiAdvanced::default()),
            StrategyKind::AiFull => Self::AiFull(
                AiBasic::default(),
                AiAdvanced::default(),
                AiFull::default(),
            ),
            StrategyKind::Ichimoku
            | StrategyKind::SuperTrend
            | StrategyKind::Dmi
            | StrategyKind::Williams
            | StrategyKind::TrendFollow
            | StrategyKind::VolBreakout
            | StrategyKind::MultiMa
            | StrategyKind::MomentumRev
            | StrategyKind::VolumeBreak => return Err(StrategyError::Unimplemented(kind)),
        };
        Ok(strategy)
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Rsi(_) => StrategyKind::Rsi,
            Self::Macd(_) => StrategyKind::Macd,
            Self::Bollinger(_) => StrategyKind::Bollinger,
            Self::Stochastic(_) => StrategyKind::Stochastic,
            Self::Sma(_) => StrategyKind::Sma,
            Self::Vwap(_) => StrategyKind::Vwap,
            Self::AiBasic(_) => StrategyKind::AiBasic,
            Self::AiAdvanced(..) => StrategyKind::AiAdvanced,
            Self::AiFull(..) => StrategyKind::AiFull,
        }
    }

    /// Samples needed before any predicate can answer `true`.
    pub fn warmup(&self) -> usize {
        match self {
            Self::Rsi(r) => r.warmup(),
            Self::Macd(r) => r.warmup(),
            Self::Bollinger(r) => r.warmup(),
            Self::Stochastic(r) => r.warmup(),
            Self::Sma(r) => r.warmup(),
            Self::Vwap(r) => r.warmup(),
            Self::AiBasic(basic) => basic.warmup(),
            Self::AiAdvanced(basic, adv) => basic.warmup().max(adv.warmup()),
            Self::AiFull(basic, adv, full) => basic.warmup().max(adv.warmup()).max(full.warmup()),
        }
    }

    pub fn evaluate(&self, samples: &[Sample]) -> Evaluation {
        let required = self.warmup();
        if samples.len() < required {
            return Evaluation::insufficient(required, samples.len());
        }

        match self {
            Self::Rsi(r) => r.evaluate(samples),
            Self::Macd(r) => r.evaluate(samples),
            Self::Bollinger(r) => r.evaluate(samples),
            Self::Stochastic(r) => r.evaluate(samples),
            Self::Sma(r) => r.evaluate(samples),
            Self::Vwap(r) => r.evaluate(samples),
            Self::AiBasic(basic) => {
                let mut eval = Evaluation::ready();
                let verdict = basic.assess(samples, &mut eval.readouts);
                tier_evaluation(eval, verdict, "basic")
            }
            Self::AiAdvanced(basic, adv) => {
                let mut eval = Evaluation::ready();
                let basic_verdict = basic.assess(samples, &mut eval.readouts);
                let verdict = adv.assess(samples, basic_verdict, &mut eval.readouts);
                tier_evaluation(eval, verdict, "advanced")
            }
            Self::AiFull(basic, adv, full) => {
                let mut eval = Evaluation::ready();
                let basic_verdict = basic.assess(samples, &mut eval.readouts);
                let adv_verdict = adv.assess(samples, basic_verdict, &mut eval.readouts);
                let verdict = full.assess(samples, adv_verdict, &mut eval.readouts);
                eval.buy = verdict.buy.fires();
                eval.sell = verdict.sell.fires();
                eval.phase = verdict.phase;
                eval.confidence = Some((verdict.buy, verdict.sell));
                eval.with_reason(
                    format!("buy confidence {}/{}", verdict.buy.votes, verdict.buy.total),
                    format!("sell confidence {}/{}", verdict.sell.votes, verdict.sell.total),
                )
            }
        }
    }

    pub fn should_buy(&self, samples: &[Sample]) -> bool {
        self.evaluate(samples).buy
    }

    pub fn should_sell(&self, samples: &[Sample]) -> bool {
        self.evaluate(samples).sell
    }
}

fn tier_evaluation(mut eval: Evaluation, verdict: TierVerdict, tier: &str) -> Evaluation {
    eval.buy = verdict.buy;
    eval.sell = verdict.sell;
    eval.with_reason(format!("ai {tier} buy"), format!("ai {tier} sell"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_samples;

    #[test]
    fn unimplemented_kinds_are_reported() {
        for kind in StrategyKind::ALL {
            match Strategy::from_kind(kind) {
                Ok(strategy) => {
                    assert!(kind.is_implemented());
                    assert_eq!(strategy.kind(), kind);
                }
                Err(StrategyError::Unimplemented(k)) => {
                    assert_eq!(k, kind);
                    assert!(!kind.is_implemented());
                }
            }
        }
    }

    #[test]
    fn default_warmups() {
        let expected = [
            (StrategyKind::Rsi, 15),
            (StrategyKind::Macd, 34),
            (StrategyKind::Bollinger, 20),
            (StrategyKind::Stochastic, 16),
            (StrategyKind::Sma, 20),
            (StrategyKind::Vwap, 14),
            (StrategyKind::AiBasic, 34),
            (StrategyKind::AiAdvanced, 34),
            (StrategyKind::AiFull, 120),
        ];
        for (kind, warmup) in expected {
            assert_eq!(Strategy::from_kind(kind).unwrap().warmup(), warmup, "{kind}");
        }
    }

    #[test]
    fn short_series_reports_insufficient_warmup() {
        let strategy = Strategy::from_kind(StrategyKind::Macd).unwrap();
        let samples = make_samples(&[100.0; 10]);
        let eval = strategy.evaluate(&samples);
        assert!(!eval.buy && !eval.sell);
        assert_eq!(
            eval.warmup,
            WarmupStatus::Insufficient {
                required: 34,
                available: 10
            }
        );
        assert!(eval.readouts.is_empty());
    }

    #[test]
    fn decision_prefers_buy() {
        let mut eval = Evaluation::ready();
        assert_eq!(eval.decision(), None);
        eval.sell = true;
        assert_eq!(eval.decision(), Some(SignalKind::Sell));
        eval.buy = true;
        assert_eq!(eval.decision(), Some(SignalKind::Buy));
    }

    #[test]
    fn ai_full_reports_confidence() {
        let closes: Vec<f64> = (0..150).map(|i| 100.0 + (i as f64 * 0.1).sin() * 5.0).collect();
        let strategy = Strategy::from_kind(StrategyKind::AiFull).unwrap();
        let eval = strategy.evaluate(&make_samples(&closes));
        assert!(eval.is_ready());
        let (buy, sell) = eval.confidence.unwrap();
        assert_eq!(eval.buy, buy.fires());
        assert_eq!(eval.sell, sell.fires());
        assert!(eval.readouts.contains_key("confidence_buy"));
    }
}
