//! Coinloop CLI: strategy catalog, series analysis, session runs and key storage.
//!
//! Commands:
//! - `strategies`: list the strategy catalog and which kinds are implemented
//! - `instruments`: list the instrument registry by group
//! - `config`: print the effective configuration as TOML
//! - `analyze`: evaluate one strategy and the standard indicators over a CSV
//! - `run`: drive a trading session against a replayed or synthetic account
//! - `keys save` / `keys show`: manage stored exchange credentials

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use coinloop_core::account::{
    balance_guard, read_samples_csv, AccountCollaborator, Balance, CandleInterval, ReplayAccount,
    SyntheticAccount,
};
use coinloop_core::components::IndicatorValues;
use coinloop_core::config::CoreConfig;
use coinloop_core::credentials::{ApiKeys, CredentialStore};
use coinloop_core::domain::Instrument;
use coinloop_core::indicators::standard_indicators;
use coinloop_core::session::{Poller, SessionSettings, SharedSession, TradingSession};
use coinloop_core::strategy::{Strategy, StrategyKind};
use coinloop_core::trade_log::TradeLog;

#[derive(Parser)]
#[command(
    name = "coinloop",
    about = "Coinloop: indicator and strategy engine for a crypto polling loop"
)]
struct Cli {
    /// Path to a TOML config file. Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    /// Replay candles from a CSV file.
    Replay,
    /// Seeded random walk.
    Synthetic,
}

#[derive(Subcommand)]
enum Commands {
    /// List the strategy catalog.
    Strategies,
    /// List the instrument registry by group.
    Instruments,
    /// Print the effective configuration as TOML.
    Config,
    /// Evaluate a strategy and the standard indicators over a CSV series.
    Analyze {
        /// CSV with timestamp,open,high,low,close,volume columns.
        #[arg(long)]
        csv: PathBuf,

        /// Strategy key (e.g. RSI, MACD, AI_Full).
        #[arg(long, default_value = "RSI")]
        strategy: String,
    },
    /// Run a trading session until the data or the tick budget runs out.
    Run {
        /// Strategy key (e.g. RSI, MACD, AI_Full).
        #[arg(long, default_value = "RSI")]
        strategy: String,

        /// Instrument code (e.g. KRW-BTC).
        #[arg(long, default_value = "KRW-BTC")]
        instrument: String,

        /// Order amount in quote currency. Defaults to the configured amount.
        #[arg(long)]
        amount: Option<f64>,

        #[arg(long, value_enum, default_value_t = Source::Synthetic)]
        source: Source,

        /// CSV for `--source replay`.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Samples revealed before the first tick (replay) or pre-generated
        /// (synthetic).
        #[arg(long, default_value_t = 120)]
        history: usize,

        /// Seed for `--source synthetic`.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Quote-currency balance reported by the account.
        #[arg(long, default_value_t = 1_000_000.0)]
        balance: f64,

        /// Stop after this many ticks.
        #[arg(long, default_value_t = 100)]
        ticks: usize,

        /// Milliseconds between ticks. Defaults to the configured interval.
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Append fired signals to this CSV trade log.
        #[arg(long)]
        trade_log: Option<PathBuf>,
    },
    /// Exchange credential storage.
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },
}

#[derive(Subcommand)]
enum KeysAction {
    /// Store an access/secret key pair.
    Save {
        #[arg(long)]
        access_key: String,
        #[arg(long)]
        secret_key: String,
    },
    /// Show the stored access key (the secret is never printed).
    Show,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Strategies => run_strategies(&config),
        Commands::Instruments => run_instruments(&config),
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Commands::Analyze { csv, strategy } => run_analyze(&config, &csv, &strategy),
        Commands::Run {
            strategy,
            instrument,
            amount,
            source,
            csv,
            history,
            seed,
            balance,
            ticks,
            interval_ms,
            trade_log,
        } => {
            let opts = RunOptions {
                strategy,
                instrument,
                amount,
                source,
                csv,
                history,
                seed,
                balance,
                ticks,
                interval_ms,
                trade_log,
            };
            run_session(config, opts)
        }
        Commands::Keys { action } => run_keys(action),
    }
}

fn load_config(path: Option<&Path>) -> Result<CoreConfig> {
    match path {
        Some(path) => CoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(CoreConfig::default()),
    }
}

fn parse_kind(key: &str) -> Result<StrategyKind> {
    let kind: StrategyKind = key.parse()?;
    if !kind.is_implemented() {
        bail!("strategy {kind} is listed but not implemented");
    }
    Ok(kind)
}

fn run_strategies(config: &CoreConfig) -> Result<()> {
    println!("{:<12} {:<6} {:<6} {}", "Key", "Impl", "Band", "Description");
    println!("{}", "-".repeat(72));
    for kind in StrategyKind::ALL {
        let (name, band) = config
            .strategy_info(kind)
            .map(|info| (info.description.as_str(), info.target_band_pct))
            .unwrap_or(("", config.target_band_pct(kind)));
        println!(
            "{:<12} {:<6} {:<6} {}",
            kind.key(),
            match (kind.is_implemented(), kind.is_composite()) {
                (true, true) => "tier",
                (true, false) => "yes",
                (false, _) => "no",
            },
            format!("{band:.1}%"),
            name
        );
    }
    Ok(())
}

fn run_instruments(config: &CoreConfig) -> Result<()> {
    for (group, instruments) in &config.instruments {
        let codes: Vec<&str> = instruments.iter().map(|i| i.code()).collect();
        println!("{group:<16} {}", codes.join(" "));
    }
    println!();
    println!("{} instruments", config.all_instruments().len());
    Ok(())
}

fn run_analyze(config: &CoreConfig, csv: &Path, key: &str) -> Result<()> {
    let kind = parse_kind(key)?;
    let mut samples =
        read_samples_csv(csv).with_context(|| format!("reading {}", csv.display()))?;
    let retention = config.series.retention;
    if samples.len() > retention {
        samples.drain(..samples.len() - retention);
    }

    let strategy = Strategy::from_kind(kind)?;
    let evaluation = strategy.evaluate(&samples);
    let values = IndicatorValues::compute_all(&samples, &standard_indicators());

    println!("=== {kind} over {} samples ===", samples.len());
    if let Some(last) = samples.last() {
        println!("Last close:     {:.2} at {}", last.close, last.timestamp);
    }
    if !evaluation.is_ready() {
        println!("Warming up:     {:?}", evaluation.warmup);
    }
    println!(
        "Decision:       {}",
        evaluation
            .decision()
            .map_or("none".to_string(), |k| k.to_string())
    );
    if let Some(reason) = &evaluation.reason {
        println!("Reason:         {reason}");
    }
    if let Some(phase) = evaluation.phase {
        println!("Market phase:   {phase}");
    }
    if let Some((buy, sell)) = evaluation.confidence {
        println!(
            "Confidence:     buy {:.0}% / sell {:.0}%",
            buy.ratio() * 100.0,
            sell.ratio() * 100.0
        );
    }

    println!();
    println!("--- Strategy readouts ---");
    for (name, value) in &evaluation.readouts {
        println!("{name:<24} {value:>14.4}");
    }

    println!();
    println!("--- Standard indicators ---");
    for (name, value) in values.latest() {
        match value {
            Some(v) => println!("{name:<24} {v:>14.4}"),
            None => println!("{name:<24} {:>14}", "-"),
        }
    }
    Ok(())
}

struct RunOptions {
    strategy: String,
    instrument: String,
    amount: Option<f64>,
    source: Source,
    csv: Option<PathBuf>,
    history: usize,
    seed: u64,
    balance: f64,
    ticks: usize,
    interval_ms: Option<u64>,
    trade_log: Option<PathBuf>,
}

fn run_session(mut config: CoreConfig, opts: RunOptions) -> Result<()> {
    let kind = parse_kind(&opts.strategy)?;
    let instrument = Instrument::parse(&opts.instrument)?;
    let amount = opts.amount.unwrap_or(config.trade.default_amount);

    let balance = Balance {
        quote_balance: opts.balance,
        base_balance: 0.0,
    };
    let account: Arc<dyn AccountCollaborator> = match opts.source {
        Source::Replay => {
            let Some(csv) = opts.csv.as_deref() else {
                bail!("--source replay requires --csv");
            };
            let account = ReplayAccount::from_csv(instrument.clone(), csv)
                .with_context(|| format!("reading {}", csv.display()))?
                .with_history(opts.history)
                .with_balance(balance);
            Arc::new(account)
        }
        Source::Synthetic => Arc::new(
            SyntheticAccount::new(opts.seed, 100.0, opts.history, CandleInterval::Minute1)
                .with_balance(balance),
        ),
    };

    if !config.is_recognized(&instrument) {
        info!(%instrument, "registering instrument in the custom group");
        config
            .instruments
            .entry("custom".into())
            .or_default()
            .push(instrument.clone());
    }

    let reported = account.balance(&instrument)?;
    let limit = balance_guard(amount, &reported, config.risk_tier())?;
    info!(amount, limit, risk = ?config.trade.risk_level, "balance check passed");

    let interval = opts
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(config.trade.interval_secs));

    let mut session = TradingSession::new(config);
    if let Some(path) = opts.trade_log.as_deref() {
        let log = TradeLog::open(path)
            .with_context(|| format!("opening trade log {}", path.display()))?;
        session = session.with_trade_log(log);
    }

    let shared = Arc::new(SharedSession::new(session, account));
    shared.start(kind, SessionSettings::new(instrument, amount))?;

    let poller = Poller::spawn(Arc::clone(&shared), interval, Some(opts.ticks))?;
    let summary = poller.join();
    shared.stop()?;

    println!();
    println!("=== Session Summary ===");
    println!("Ticks:          {}", summary.ticks);
    println!("Signals:        {}", summary.signals);
    println!("Errors:         {}", summary.errors);
    println!("Discarded:      {}", summary.discarded);
    println!();
    print!("{}", shared.status().render());
    Ok(())
}

fn credential_store() -> Result<CredentialStore> {
    let dir = dirs::config_dir().context("no user config directory on this platform")?;
    Ok(CredentialStore::new(dir.join("coinloop").join("api_keys.json")))
}

fn run_keys(action: KeysAction) -> Result<()> {
    let store = credential_store()?;
    match action {
        KeysAction::Save {
            access_key,
            secret_key,
        } => {
            let keys = ApiKeys::new(access_key, secret_key)?;
            store.save(&keys)?;
            println!("Keys saved to {}", store.path().display());
        }
        KeysAction::Show => match store.load()? {
            Some(keys) => println!("Access key: {}", keys.access_key()),
            None => println!("No keys stored at {}", store.path().display()),
        },
    }
    Ok(())
}
