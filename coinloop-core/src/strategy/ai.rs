//! Composite "AI" tiers.
//!
//! The tiers compose explicitly: `AiBasic` yields a [`TierVerdict`],
//! `AiAdvanced` refines a basic verdict, and `AiFull` turns an advanced
//! verdict plus three diagnostics into a [`Confidence`] vote. Every
//! sub-condition is evaluated on each call; none short-circuits the others.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::Sample;
use crate::indicators::{
    last_defined, market_phase, momentum, sma_of_series, trend, volatility, volume_average,
    MarketPhase,
};

use super::rules::{core_readings, gt, last_close, lt, record, BollingerRule, MacdRule, RsiRule, VwapRule};

/// Buy/sell outcome of one tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierVerdict {
    pub buy: bool,
    pub sell: bool,
}

/// RSI + MACD agreement, or a Bollinger band breach.
///
/// buy:  (rsi < 30 and macd > signal) or close < lower
/// sell: (rsi > 70 and macd < signal) or close > upper
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AiBasic {
    pub rsi: RsiRule,
    pub macd: MacdRule,
    pub bands: BollingerRule,
}

impl AiBasic {
    pub fn warmup(&self) -> usize {
        self.rsi
            .warmup()
            .max(self.macd.warmup())
            .max(self.bands.warmup())
    }

    pub fn assess(&self, samples: &[Sample], readouts: &mut BTreeMap<String, f64>) -> TierVerdict {
        let r = core_readings(samples, &self.rsi, &self.macd, &self.bands);
        let close = last_close(samples);

        record(readouts, "rsi", r.rsi);
        record(readouts, "macd", r.macd);
        record(readouts, "macd_signal", r.signal);
        record(readouts, "bb_upper", r.upper);
        record(readouts, "bb_middle", r.middle);
        record(readouts, "bb_lower", r.lower);

        let rsi_buy = lt(r.rsi, Some(self.rsi.oversold));
        let macd_buy = gt(r.macd, r.signal);
        let band_buy = lt(close, r.lower);

        let rsi_sell = gt(r.rsi, Some(self.rsi.overbought));
        let macd_sell = lt(r.macd, r.signal);
        let band_sell = gt(close, r.upper);

        TierVerdict {
            buy: (rsi_buy && macd_buy) || band_buy,
            sell: (rsi_sell && macd_sell) || band_sell,
        }
    }
}

/// Refines a basic verdict with VWAP, trend and volume.
///
/// buy:  basic buy and (close < vwap or (trend > 0 and volume > average))
/// sell: basic sell and (close > vwap or (trend < 0 and volume < average))
#[derive(Debug, Clone, PartialEq)]
pub struct AiAdvanced {
    pub vwap: VwapRule,
    pub trend_period: usize,
    pub volume_period: usize,
}

impl Default for AiAdvanced {
    fn default() -> Self {
        Self {
            vwap: VwapRule::default(),
            trend_period: 20,
            volume_period: 20,
        }
    }
}

impl AiAdvanced {
    pub fn warmup(&self) -> usize {
        self.vwap
            .warmup()
            .max(self.trend_period + 1)
            .max(self.volume_period)
    }

    pub fn assess(
        &self,
        samples: &[Sample],
        basic: TierVerdict,
        readouts: &mut BTreeMap<String, f64>,
    ) -> TierVerdict {
        let close = last_close(samples);
        let vwap = self.vwap.reading(samples);
        let trend = last_defined(&trend(samples, self.trend_period));
        let volume = samples.last().map(|s| s.volume);
        let volume_avg = last_defined(&volume_average(samples, self.volume_period));

        record(readouts, "vwap", vwap);
        record(readouts, "trend", trend);
        record(readouts, "volume_average", volume_avg);

        let vwap_buy = lt(close, vwap);
        let flow_buy = gt(trend, Some(0.0)) && gt(volume, volume_avg);
        let vwap_sell = gt(close, vwap);
        let flow_sell = lt(trend, Some(0.0)) && lt(volume, volume_avg);

        TierVerdict {
            buy: basic.buy && (vwap_buy || flow_buy),
            sell: basic.sell && (vwap_sell || flow_sell),
        }
    }
}

/// Fraction of agreeing votes, compared strictly against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Confidence {
    pub votes: usize,
    pub total: usize,
    pub threshold: f64,
}

impl Confidence {
    pub fn from_votes(votes: &[bool], threshold: f64) -> Self {
        Self {
            votes: votes.iter().filter(|v| **v).count(),
            total: votes.len(),
            threshold,
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.votes as f64 / self.total as f64
        }
    }

    pub fn fires(&self) -> bool {
        self.ratio() > self.threshold
    }
}

/// Outcome of the full tier: one confidence per side and the market phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FullVerdict {
    pub buy: Confidence,
    pub sell: Confidence,
    pub phase: Option<MarketPhase>,
}

/// Votes an advanced verdict together with volatility regime, momentum
/// sign and market phase.
#[derive(Debug, Clone, PartialEq)]
pub struct AiFull {
    pub volatility_period: usize,
    pub volatility_window: usize,
    pub momentum_period: usize,
    pub phase_period: usize,
    pub threshold: f64,
}

impl Default for AiFull {
    fn default() -> Self {
        Self {
            volatility_period: 20,
            volatility_window: 100,
            momentum_period: 14,
            phase_period: 20,
            threshold: 0.7,
        }
    }
}

impl AiFull {
    pub fn warmup(&self) -> usize {
        (self.volatility_period + self.volatility_window)
            .max(self.momentum_period + 1)
            .max(self.phase_period)
    }

    pub fn assess(
        &self,
        samples: &[Sample],
        advanced: TierVerdict,
        readouts: &mut BTreeMap<String, f64>,
    ) -> FullVerdict {
        let vol_series = volatility(samples, self.volatility_period);
        let vol = last_defined(&vol_series);
        let vol_avg = last_defined(&sma_of_series(&vol_series, self.volatility_window));
        let mom = last_defined(&momentum(samples, self.momentum_period));
        let phase = market_phase(samples, self.phase_period)
            .last()
            .copied()
            .flatten();

        record(readouts, "volatility", vol);
        record(readouts, "volatility_average", vol_avg);
        record(readouts, "momentum", mom);

        let buy_votes = [
            advanced.buy,
            lt(vol, vol_avg),
            gt(mom, Some(0.0)),
            phase.is_some_and(|p| p.is_bullish()),
        ];
        let sell_votes = [
            advanced.sell,
            gt(vol, vol_avg),
            lt(mom, Some(0.0)),
            phase.is_some_and(|p| p.is_bearish()),
        ];

        let verdict = FullVerdict {
            buy: Confidence::from_votes(&buy_votes, self.threshold),
            sell: Confidence::from_votes(&sell_votes, self.threshold),
            phase,
        };
        readouts.insert("confidence_buy".into(), verdict.buy.ratio());
        readouts.insert("confidence_sell".into(), verdict.sell.ratio());
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_samples;

    #[test]
    fn confidence_threshold_is_strict() {
        assert!(!Confidence::from_votes(&[true, true, false, false], 0.7).fires());
        assert!(Confidence::from_votes(&[true, true, true, false], 0.7).fires());
        assert!(!Confidence::from_votes(&[true, false], 0.5).fires());
        assert_eq!(Confidence::from_votes(&[], 0.7).ratio(), 0.0);
    }

    #[test]
    fn tier_warmups() {
        assert_eq!(AiBasic::default().warmup(), 34);
        assert_eq!(AiAdvanced::default().warmup(), 21);
        assert_eq!(AiFull::default().warmup(), 120);
    }

    #[test]
    fn advanced_never_fires_without_basic() {
        let samples = make_samples(&(0..40).map(|i| 200.0 - i as f64).collect::<Vec<_>>());
        let mut readouts = BTreeMap::new();
        let verdict = AiAdvanced::default().assess(&samples, TierVerdict::default(), &mut readouts);
        assert_eq!(verdict, TierVerdict::default());
        assert!(readouts.contains_key("vwap"));
    }

    #[test]
    fn basic_band_breach_buys() {
        let mut closes = vec![100.0; 40];
        closes.push(70.0);
        let mut readouts = BTreeMap::new();
        let verdict = AiBasic::default().assess(&make_samples(&closes), &mut readouts);
        assert!(verdict.buy);
        assert!(!verdict.sell);
    }

    #[test]
    fn basic_band_breach_sells() {
        let mut closes = vec![100.0; 40];
        closes.push(130.0);
        let mut readouts = BTreeMap::new();
        let verdict = AiBasic::default().assess(&make_samples(&closes), &mut readouts);
        assert!(verdict.sell);
        assert!(!verdict.buy);
        assert!(readouts["bb_upper"] < 130.0);
    }

    #[test]
    fn basic_sells_on_overbought_rsi_with_bearish_macd() {
        // long climb then a short pullback: RSI stays overbought while the
        // MACD line turns under its signal
        let mut closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        closes.extend([158.0, 157.0, 156.0]);
        let mut readouts = BTreeMap::new();
        let verdict = AiBasic::default().assess(&make_samples(&closes), &mut readouts);
        assert!(readouts["rsi"] > 70.0, "{readouts:?}");
        assert!(readouts["macd"] < readouts["macd_signal"], "{readouts:?}");
        assert!(readouts["bb_upper"] > 156.0);
        assert!(verdict.sell);
        assert!(!verdict.buy);
    }

    #[test]
    fn advanced_sells_on_falling_trend_with_thin_volume() {
        let mut samples = make_samples(&(0..40).map(|i| 200.0 - i as f64).collect::<Vec<_>>());
        let basic = TierVerdict { buy: false, sell: true };
        let advanced = AiAdvanced::default();

        // close is under vwap, so only the trend/volume path can confirm
        let mut readouts = BTreeMap::new();
        assert!(!advanced.assess(&samples, basic, &mut readouts).sell);
        assert!(readouts["trend"] < 0.0);

        if let Some(last) = samples.last_mut() {
            last.volume = 500.0;
        }
        let verdict = advanced.assess(&samples, basic, &mut BTreeMap::new());
        assert!(verdict.sell);
        assert!(!verdict.buy);
    }

    #[test]
    fn advanced_sells_above_vwap() {
        let samples = make_samples(&(0..40).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let basic = TierVerdict { buy: false, sell: true };
        let verdict = AiAdvanced::default().assess(&samples, basic, &mut BTreeMap::new());
        assert!(verdict.sell);
    }

    #[test]
    fn full_bearish_votes_fire_sell() {
        let closes: Vec<f64> = (0..130).map(|i| 200.0 - 0.5 * i as f64).collect();
        let samples = make_samples(&closes);
        let verdict = AiFull::default().assess(
            &samples,
            TierVerdict { buy: false, sell: true },
            &mut BTreeMap::new(),
        );
        assert!(verdict.phase.is_some_and(|p| p.is_bearish()));
        assert!(verdict.sell.votes >= 3);
        assert!(verdict.sell.fires());
        assert!(!verdict.buy.fires());
    }

    #[test]
    fn full_counts_advanced_vote() {
        let closes: Vec<f64> = (0..130).map(|i| 100.0 + (i as f64 * 0.2).sin()).collect();
        let samples = make_samples(&closes);
        let full = AiFull::default();
        let mut a = BTreeMap::new();
        let mut b = BTreeMap::new();
        let without = full.assess(&samples, TierVerdict::default(), &mut a);
        let with = full.assess(&samples, TierVerdict { buy: true, sell: false }, &mut b);
        assert_eq!(with.buy.votes, without.buy.votes + 1);
        assert_eq!(with.sell.votes, without.sell.votes);
        assert_eq!(with.buy.total, 4);
    }
}
