// In app/src/main.rs

use anyhow::{Context, Result};
use api_client::{ApiClient, FallbackMarketData, MarketDataSource, YahooClient};
use app_config::Settings;
use clap::{Parser, Subcommand};
use core_types::Symbol;
use engine::{DailySchedule, Engine, TradingCycle};
use execution::{Broker, LiveBroker, PositionController};
use risk::{DailyRiskGovernor, LocalClock, StateStore};
use std::fs::{self, OpenOptions};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use strategies::MACrossover;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "A daily moving-average crossover trader for a single equity.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs one trading cycle, or a daily loop with `--loop`.
    Run {
        /// Keep running and repeat the cycle every day at `app.schedule_time`.
        #[arg(long = "loop")]
        run_loop: bool,
    },

    /// Prints today's persisted risk state and the broker's current position.
    Status,

    /// Cancels an open order at the broker.
    Cancel {
        /// The broker's order id.
        #[arg(long)]
        order_id: String,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let settings = app_config::load_settings().context("failed to load configuration")?;
    init_tracing(&settings)?;
    tracing::info!(environment = %settings.app.environment, symbol = %settings.trading.symbol, "Starting trader.");

    match cli.command {
        Commands::Run { run_loop } => handle_run(&settings, run_loop).await?,
        Commands::Status => handle_status(&settings).await?,
        Commands::Cancel { order_id } => handle_cancel(&settings, &order_id).await?,
    }

    Ok(())
}

/// Installs a console layer and, when configured, a plain-text file layer.
fn init_tracing(settings: &Settings) -> Result<()> {
    let level = tracing::Level::from_str(&settings.app.log_level)
        .with_context(|| format!("invalid log level '{}'", settings.app.log_level))?;
    let filter = Targets::new()
        .with_target("hyper", tracing::Level::WARN)
        .with_target("reqwest", tracing::Level::WARN)
        .with_default(level);

    let file_layer = match &settings.app.log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .with(filter)
        .init();
    Ok(())
}

// --- "Run" Subcommand Logic ---

async fn handle_run(settings: &Settings, run_loop: bool) -> Result<()> {
    let api_client = api_client::new(&settings.alpaca)?;
    let broker = build_broker(settings, &api_client);

    let primary: Box<dyn MarketDataSource> = Box::new(api_client);
    let fallback: Option<Box<dyn MarketDataSource>> = if settings.market_data.fallback_enabled {
        Some(Box::new(YahooClient::new(&settings.market_data.yahoo_base_url)?))
    } else {
        None
    };
    let data = Arc::new(FallbackMarketData::new(primary, fallback));

    let strategy = MACrossover::new(settings.strategy.clone())?;
    let governor = DailyRiskGovernor::new(&settings.risk, Arc::new(LocalClock))?;

    let cycle = TradingCycle::new(
        &settings.trading,
        Box::new(strategy),
        Box::new(governor),
        data,
        broker,
    );
    let schedule = DailySchedule::from_str(&settings.app.schedule_time)?;
    let mut engine = Engine::new(cycle, schedule);

    if run_loop {
        engine.run_forever().await
    } else {
        let outcome = engine.run_once().await?;
        println!("{outcome}");
        Ok(())
    }
}

/// The Alpaca broker. Paper or live is decided by `alpaca.base_url` alone, so
/// the position the controller reads back is always the account's own.
fn build_broker(settings: &Settings, api_client: &ApiClient) -> Arc<dyn Broker> {
    if settings.alpaca.is_paper() {
        tracing::info!(base_url = %settings.alpaca.base_url, "Trading against the Alpaca paper account.");
    } else {
        tracing::warn!(base_url = %settings.alpaca.base_url, "LIVE TRADING IS ENABLED. REAL ORDERS WILL BE PLACED.");
    }
    Arc::new(LiveBroker::new(api_client.clone()))
}

// --- "Status" Subcommand Logic ---

async fn handle_status(settings: &Settings) -> Result<()> {
    let store = StateStore::new(&settings.risk.state_file);
    match store.load()? {
        Some(state) => println!(
            "risk state ({}): date {}, trades {}/{}, starting balance {}, daily loss {:.2}%",
            store.path().display(),
            state.date,
            state.trades_count,
            settings.risk.max_trades_per_day,
            state.starting_balance,
            state.daily_loss * rust_decimal::Decimal::ONE_HUNDRED
        ),
        None => println!("risk state ({}): none recorded", store.path().display()),
    }

    let broker: Arc<dyn Broker> = Arc::new(LiveBroker::new(api_client::new(&settings.alpaca)?));
    let symbol = Symbol(settings.trading.symbol.clone());
    let position = PositionController::new(broker.clone()).position(&symbol).await?;
    println!("equity: {}", broker.equity().await?);
    println!("position {symbol}: {position}");
    Ok(())
}

// --- "Cancel" Subcommand Logic ---

async fn handle_cancel(settings: &Settings, order_id: &str) -> Result<()> {
    let broker = LiveBroker::new(api_client::new(&settings.alpaca)?);
    broker
        .cancel_order(order_id)
        .await
        .with_context(|| format!("failed to cancel order {order_id}"))?;
    println!("cancelled order {order_id}");
    Ok(())
}
