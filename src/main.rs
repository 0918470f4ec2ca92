use std::path::PathBuf;

use clap::Parser;
use tokio::time::{interval, Duration, MissedTickBehavior};

use fxbot::config::AppConfig;
use fxbot::execution::{Coordinator, SimulatedGateway, SyntheticFeed};
use fxbot::models::Timeframe;
use fxbot::risk::RiskManager;
use fxbot::strategy::{build_engine, SessionFilter, StrategyKind};

/// Extra history generated beyond the engine's minimum window.
const WARMUP_MARGIN: usize = 50;

/// Log the portfolio summary every this many cycles.
const SUMMARY_EVERY: u32 = 12;

#[derive(Parser, Debug)]
#[command(name = "fxbot", about = "Rule-based FX decision engine, paper-trading mode")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Strategy override: breakout or crossover
    #[arg(long)]
    strategy: Option<StrategyKind>,

    /// Symbols override, comma separated (e.g. EURUSD,USDJPY)
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Seconds between evaluation cycles
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Seed for the synthetic price feed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Starting paper-trading balance
    #[arg(long, default_value_t = 10_000.0)]
    balance: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(kind) = cli.strategy {
        config.strategy.kind = kind;
    }
    if !cli.symbols.is_empty() {
        config.symbols = cli.symbols.clone();
    }
    if let Some(secs) = cli.interval_secs {
        config.interval_secs = secs;
    }
    config.validate()?;
    if let Ok(echo) = serde_json::to_string(&config) {
        tracing::debug!(config = %echo, "effective configuration");
    }

    tracing::info!("fxbot starting");
    tracing::info!("Configuration:");
    tracing::info!("  Strategy: {:?}", config.strategy.kind);
    tracing::info!("  Symbols: {:?}", config.symbols);
    tracing::info!("  Timeframe: {}", config.timeframe.as_str());
    tracing::info!("  Risk per trade: {}%", config.risk.risk_per_trade * 100.0);
    tracing::info!("  Max daily loss: {}%", config.risk.max_daily_loss * 100.0);
    tracing::info!("  Session filter: {}", config.session.enabled);
    tracing::info!("  Paper balance: ${:.2}", cli.balance);

    let mut engine = build_engine(config.strategy.kind, &config.strategy)?;
    if config.session.enabled {
        engine = Box::new(SessionFilter::new(engine, &config.session));
    }

    let warmup = engine.min_bars_required() + WARMUP_MARGIN;
    let feed = SyntheticFeed::new(&config.symbols, config.timeframe, warmup, cli.seed);
    let gateway = SimulatedGateway::new(cli.balance);
    let risk = RiskManager::new(config.risk.clone())?;

    let coordinator = Coordinator::new(
        config.symbols.clone(),
        config.timeframe,
        engine,
        risk,
        feed,
        gateway,
    );

    let trading_task = tokio::spawn(trading_loop(
        coordinator,
        config.timeframe,
        config.interval_secs,
    ));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        result = trading_task => {
            tracing::error!("Trading loop exited: {:?}", result);
        }
    }

    tracing::info!("fxbot stopped");
    Ok(())
}

fn setup_logging() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "fxbot=info".to_string());
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Advance the feed by one bar and run a decision cycle on every tick.
async fn trading_loop(
    mut coordinator: Coordinator<SyntheticFeed, SimulatedGateway>,
    timeframe: Timeframe,
    interval_secs: u64,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut tick: u32 = 0;
    loop {
        ticker.tick().await;
        tick += 1;

        coordinator.data_mut().advance(timeframe);
        if let Err(e) = coordinator.run_cycle() {
            tracing::error!(error = %e, "cycle failed");
        }

        if tick % SUMMARY_EVERY == 0 {
            coordinator.log_summary();
        }
    }
}
