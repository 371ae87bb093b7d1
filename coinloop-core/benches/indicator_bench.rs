//! Criterion benchmarks for the evaluation hot path.
//!
//! Benchmarks:
//! 1. Batch indicator stack over the retained window
//! 2. Incremental indicators, one sample at a time
//! 3. Strategy evaluation per kind
//! 4. A full session tick against an in-memory account

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use coinloop_core::account::{CandleInterval, SyntheticAccount};
use coinloop_core::components::IndicatorValues;
use coinloop_core::config::CoreConfig;
use coinloop_core::domain::{Instrument, Sample};
use coinloop_core::indicators::{standard_indicators, LiveIndicators};
use coinloop_core::session::{SessionSettings, TradingSession};
use coinloop_core::strategy::{Strategy, StrategyKind};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_samples(n: usize) -> Vec<Sample> {
    let base = chrono::DateTime::from_timestamp(1_704_067_200, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 50_000.0 + (i as f64 * 0.1).sin() * 500.0;
            let open = close - 30.0;
            Sample::new(
                base + chrono::Duration::minutes(i as i64),
                open,
                close + 150.0,
                open - 150.0,
                close,
                10.0 + (i % 50) as f64,
            )
        })
        .collect()
}

// ── 1. Batch stack ───────────────────────────────────────────────────

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_indicators");
    let indicators = standard_indicators();
    for &n in &[200, 1000, 2000] {
        let samples = make_samples(n);
        group.bench_with_input(BenchmarkId::new("standard_stack", n), &n, |b, _| {
            b.iter(|| IndicatorValues::compute_all(black_box(&samples), black_box(&indicators)));
        });
    }
    group.finish();
}

// ── 2. Incremental ───────────────────────────────────────────────────

fn bench_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental_indicators");
    for &n in &[200, 1000, 2000] {
        let samples = make_samples(n);
        group.bench_with_input(BenchmarkId::new("push_all", n), &n, |b, _| {
            b.iter(|| {
                let mut live = LiveIndicators::new();
                for s in &samples {
                    live.push(black_box(s));
                }
                live.readings()
            });
        });
    }
    group.finish();
}

// ── 3. Strategy evaluation ───────────────────────────────────────────

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy_evaluate");
    let samples = make_samples(200);
    for kind in StrategyKind::ALL.into_iter().filter(|k| k.is_implemented()) {
        let strategy = Strategy::from_kind(kind).unwrap();
        group.bench_function(kind.key(), |b| {
            b.iter(|| strategy.evaluate(black_box(&samples)));
        });
    }
    group.finish();
}

// ── 4. Session tick ──────────────────────────────────────────────────

fn bench_session_tick(c: &mut Criterion) {
    let instrument = Instrument::parse("KRW-BTC").unwrap();
    let account = SyntheticAccount::new(7, 50_000.0, 200, CandleInterval::Minute1);
    let mut session = TradingSession::new(CoreConfig::default());
    session
        .start(StrategyKind::AiFull, SessionSettings::new(instrument, 100_000.0))
        .unwrap();

    c.bench_function("session_tick_ai_full", |b| {
        b.iter(|| session.tick(black_box(&account)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_batch,
    bench_incremental,
    bench_strategies,
    bench_session_tick,
);
criterion_main!(benches);
