//! Trend Sentinel
//!
//! Scans a relative-strength focus list of KRW spot markets with three
//! technical strategies, guards open positions with ATR stops, and rides
//! externally triggered entries out through a hard/trailing/time-decay
//! exit ladder.

mod api;
mod db;
mod indicators;
mod models;
mod notify;
mod scanner;
mod strategies;
mod trading;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::api::{ExchangeGateway, UpbitClient};
use crate::db::Database;
use crate::models::{market_symbol, TriggerEvent};
use crate::notify::{DashboardNotifier, Notifier};
use crate::scanner::ScanOrchestrator;
use crate::strategies::Brain;
use crate::trading::{
    default_watchlist, ActivePositions, EntryPriceBook, FocusList, OrderExecutor, SentinelConfig,
    TriggerHandler, WatchlistRanker,
};

/// Trend Sentinel CLI.
#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Multi-strategy spot scanner with ATR stops and an exit ladder", long_about = None)]
struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "sqlite:./sentinel.db?mode=rwc")]
    database: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Dashboard base URL for news/trade events
    #[arg(long, env = "DASHBOARD_URL")]
    dashboard_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the market scanner loop
    Scan {
        /// Seconds to rest between cycles
        #[arg(short, long, default_value = "60")]
        interval: u64,

        /// Dry run (don't execute trades)
        #[arg(long)]
        dry_run: bool,
    },

    /// Read trigger events (JSON lines) from stdin and run exit ladders
    Listen {
        /// Dry run (don't execute trades)
        #[arg(long)]
        dry_run: bool,
    },

    /// Run every strategy on one market and print the synthesized decision
    Analyze {
        /// Market or ticker (e.g. KRW-SOL or sol)
        symbol: String,
    },

    /// Compute and print the relative-strength focus list
    Watchlist,

    /// Show recent journaled decisions and exits
    Journal {
        /// Number of rows per table
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = SentinelConfig::default();

    match cli.command {
        Commands::Scan { interval, dry_run } => {
            config.scanner.scan_interval_secs = interval;

            let exchange = UpbitClient::from_env()?;
            config.scanner.dry_run = dry_run || !exchange.has_credentials();
            if config.scanner.dry_run && !dry_run {
                warn!("Exchange credentials missing. Running in dry-run mode.");
            }
            let gateway: Arc<dyn ExchangeGateway> = Arc::new(exchange);

            let db = Arc::new(Database::new(&cli.database).await?);
            let notifier = build_notifier(db.clone(), cli.dashboard_url.as_deref())?;
            let executor = Arc::new(OrderExecutor::new(
                gateway.clone(),
                notifier,
                config.scanner.dry_run,
            ));

            let orchestrator = ScanOrchestrator::new(
                gateway.clone(),
                executor,
                WatchlistRanker::new(gateway.clone(), config.ranker.clone()),
                Arc::new(FocusList::new(default_watchlist())),
                Arc::new(EntryPriceBook::new()),
                config.scanner.clone(),
                &config.risk,
            );

            println!("\n=== Trend Sentinel Scanner ===");
            println!("Scan interval: {}s", interval);
            println!(
                "Mode: {}",
                if config.scanner.dry_run { "DRY RUN (no real trades)" } else { "LIVE TRADING" }
            );
            println!("\nPress Ctrl+C to stop.\n");

            let cancel = shutdown_token();
            orchestrator.run(cancel).await;

            let (buys, sells) = db.decision_counts().await?;
            println!("\nJournal totals: {} buys, {} sells", buys, sells);
        }

        Commands::Listen { dry_run } => {
            let exchange = UpbitClient::from_env()?;
            config.ladder.dry_run = dry_run || !exchange.has_credentials();
            if config.ladder.dry_run && !dry_run {
                warn!("Exchange credentials missing. Running in dry-run mode.");
            }
            let gateway: Arc<dyn ExchangeGateway> = Arc::new(exchange);

            let db = Arc::new(Database::new(&cli.database).await?);
            let notifier = build_notifier(db, cli.dashboard_url.as_deref())?;
            let executor = Arc::new(OrderExecutor::new(
                gateway.clone(),
                notifier,
                config.ladder.dry_run,
            ));

            let cancel = shutdown_token();
            let active = ActivePositions::new();
            let handler = Arc::new(TriggerHandler::new(
                gateway,
                executor,
                active.clone(),
                config.ladder.clone(),
                &config.ranker.quote_prefix,
                cancel.clone(),
            ));

            let (tx, rx) = mpsc::channel(64);
            let handler_task = tokio::spawn(handler.run(rx));

            println!("\n=== Trend Sentinel Listener ===");
            println!("Entry cost: {} KRW", config.ladder.entry_cost);
            println!(
                "Mode: {}",
                if config.ladder.dry_run { "DRY RUN (no real trades)" } else { "LIVE TRADING" }
            );
            println!("Send {{\"symbol\":\"XYZ\",\"raw_text\":\"...\"}} lines on stdin.\n");

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    line = lines.next_line() => match line {
                        Ok(Some(line)) if line.trim().is_empty() => continue,
                        Ok(Some(line)) => match serde_json::from_str::<TriggerEvent>(&line) {
                            Ok(event) => {
                                if tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!(error = %e, "Ignoring malformed trigger line"),
                        },
                        Ok(None) => break,
                        Err(e) => {
                            warn!(error = %e, "Failed to read stdin");
                            break;
                        }
                    },
                }
            }
            drop(tx);

            if !cancel.is_cancelled() && !active.is_empty() {
                println!("Input closed. Waiting for {} open position(s) to exit...", active.len());
                while !active.is_empty() && !cancel.is_cancelled() {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }

            cancel.cancel();
            if let Err(e) = handler_task.await {
                warn!(error = %e, "Trigger handler task failed");
            }
        }

        Commands::Analyze { symbol } => {
            let symbol = market_symbol(&symbol, &config.ranker.quote_prefix);
            let gateway: Arc<dyn ExchangeGateway> = Arc::new(UpbitClient::from_env()?);

            let Some(report) = Brain::new(gateway).analyze(&symbol).await else {
                println!("Not enough hourly history for {}.", symbol);
                return Ok(());
            };

            println!("\n=== Analysis: {} ===\n", report.symbol);
            for (name, verdict) in [
                ("Livermore", &report.trend),
                ("O'Neil", &report.breakout),
                ("GCR", &report.panic),
            ] {
                println!(
                    "{:<10} {:<5} ({:>4.0}%)  {}",
                    name,
                    verdict.signal,
                    verdict.confidence * 100.0,
                    verdict.reason
                );
            }
            if let Some(ema) = report.ema {
                println!("\nClose {}  EMA20 {:.2}", report.last_close, ema);
            }
            println!("\nDecision: {}", report.decision);
        }

        Commands::Watchlist => {
            let gateway: Arc<dyn ExchangeGateway> = Arc::new(UpbitClient::from_env()?);
            let ranker = WatchlistRanker::new(gateway, config.ranker.clone());

            info!(benchmark = %config.ranker.benchmark, "Ranking relative strength");
            let focus = ranker.build().await?;

            if focus.is_empty() {
                println!("No instruments with enough history.");
                return Ok(());
            }

            println!(
                "\n{:<14} {:>12} {:>12}",
                "SYMBOL",
                format!("RS{}h", config.ranker.long_lookback),
                format!("RS{}h", config.ranker.short_lookback)
            );
            println!("{}", "-".repeat(40));
            for score in focus {
                println!(
                    "{:<14} {:>11.2}% {:>11.2}%",
                    score.symbol,
                    score.rs_long * 100.0,
                    score.rs_short * 100.0
                );
            }
        }

        Commands::Journal { limit } => {
            let db = Database::new(&cli.database).await?;

            let decisions = db.recent_decisions(limit).await?;
            println!("\n=== Recent Decisions ({}) ===\n", decisions.len());
            for d in &decisions {
                println!(
                    "{}  {:<4} {:<12} {:>14} {:<20} {}{}",
                    d.created_at,
                    d.action,
                    d.symbol,
                    d.amount,
                    truncate(&d.strategy, 20),
                    truncate(&d.reason, 60),
                    if d.dry_run { " [dry-run]" } else { "" }
                );
            }

            let exits = db.recent_exits(limit).await?;
            println!("\n=== Exit Ladder ({}) ===\n", exits.len());
            for e in &exits {
                println!(
                    "{}  {:<12} {:<10} PnL {:>7.2}%  DD {:>7.2}%  {:>6}s",
                    e.created_at,
                    e.symbol,
                    e.reason,
                    e.pnl_pct,
                    e.drawdown_pct,
                    e.elapsed_ms / 1000
                );
            }

            let (buys, sells) = db.decision_counts().await?;
            println!("\nTotals: {} buys, {} sells", buys, sells);
        }

        Commands::Config => {
            println!("\n=== Trend Sentinel Configuration ===\n");
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Journal plus, when configured, the dashboard.
fn build_notifier(db: Arc<Database>, dashboard_url: Option<&str>) -> Result<Arc<Notifier>> {
    let mut notifier = Notifier::new().with_sink(db);
    if let Some(url) = dashboard_url {
        info!(url = %url, "Dashboard notifications enabled");
        notifier = notifier.with_sink(Arc::new(DashboardNotifier::new(url)?));
    }
    debug!(sinks = notifier.len(), "Notifier ready");
    Ok(Arc::new(notifier))
}

/// Token cancelled on Ctrl+C.
fn shutdown_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                token.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });
    cancel
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
