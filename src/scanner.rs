//! Scan orchestrator: single-flight cycles over the focus list.

use futures::future::join_all;
use futures::FutureExt;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::ExchangeGateway;
use crate::models::{Candle, Signal, Timeframe};
use crate::strategies::{PanicReversionStrategy, Strategy, TrendBreakoutStrategy};
use crate::trading::{
    AtrStop, EntryPriceBook, FocusList, OrderExecutor, OrderIntent, RiskConfig, ScannerConfig,
    WatchlistRanker,
};

/// When the gated passes last ran. Lives inside the cycle lock.
#[derive(Debug, Default)]
struct CycleTimers {
    last_hourly: Option<Instant>,
    last_rank: Option<Instant>,
}

/// What one instrument's scan did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentAction {
    Idle,
    /// A SELL, or a BUY that placed no order, ended the scan without a fill.
    Handled,
    Bought,
    Sold,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    pub instruments: usize,
    pub hourly: bool,
    pub buys: usize,
    pub sells: usize,
    pub stops: usize,
    pub failures: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle held the lock; nothing was done.
    Skipped,
    Completed(CycleReport),
}

/// Drives scan cycles: ranking refresh, holdings snapshot, concurrent
/// per-instrument evaluation.
pub struct ScanOrchestrator {
    gateway: Arc<dyn ExchangeGateway>,
    executor: Arc<OrderExecutor>,
    ranker: WatchlistRanker,
    focus: Arc<FocusList>,
    entries: Arc<EntryPriceBook>,
    config: ScannerConfig,
    stop: AtrStop,
    panic_strategy: PanicReversionStrategy,
    trend_strategy: TrendBreakoutStrategy,
    cycle: Mutex<CycleTimers>,
}

impl ScanOrchestrator {
    pub fn new(
        gateway: Arc<dyn ExchangeGateway>,
        executor: Arc<OrderExecutor>,
        ranker: WatchlistRanker,
        focus: Arc<FocusList>,
        entries: Arc<EntryPriceBook>,
        config: ScannerConfig,
        risk: &RiskConfig,
    ) -> Self {
        Self {
            gateway,
            executor,
            ranker,
            focus,
            entries,
            config,
            stop: AtrStop::new(risk),
            panic_strategy: PanicReversionStrategy::default(),
            trend_strategy: TrendBreakoutStrategy::default(),
            cycle: Mutex::new(CycleTimers::default()),
        }
    }

    /// Run cycles until cancelled, sleeping `scan_interval` after each one.
    /// A cycle in flight when the token fires is allowed to finish.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            interval_secs = self.config.scan_interval_secs,
            dry_run = self.executor.is_dry_run(),
            "Starting scan loop"
        );

        loop {
            if let CycleOutcome::Completed(report) = self.run_cycle().await {
                info!(
                    instruments = report.instruments,
                    hourly = report.hourly,
                    buys = report.buys,
                    sells = report.sells,
                    stops = report.stops,
                    failures = report.failures,
                    tracked = self.entries.len().await,
                    "Scan cycle complete"
                );
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.scan_interval()) => {}
            }
        }

        info!("Scan loop stopped");
    }

    /// One scan cycle. Returns `Skipped` immediately if another cycle is
    /// still running.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(mut timers) = self.cycle.try_lock() else {
            warn!("Previous scan still running, skipping this cycle");
            return CycleOutcome::Skipped;
        };

        let now = Instant::now();
        let hourly = timers
            .last_hourly
            .map_or(true, |t| now.duration_since(t) >= self.config.hourly_interval());
        if hourly {
            info!("Running hourly checks");
            timers.last_hourly = Some(now);
        }

        let rank_due = timers
            .last_rank
            .map_or(true, |t| now.duration_since(t) >= self.ranker.config().refresh_interval());
        if rank_due {
            self.refresh_focus_list().await;
            timers.last_rank = Some(now);
        }

        let symbols = self.focus.snapshot().await;
        let holdings = self.holdings_snapshot().await;

        debug!(count = symbols.len(), "Scanning focus list");

        let scans = symbols.iter().map(|symbol| {
            AssertUnwindSafe(self.scan_instrument(symbol, &holdings, hourly)).catch_unwind()
        });
        let results = join_all(scans).await;

        let mut report = CycleReport {
            instruments: symbols.len(),
            hourly,
            ..CycleReport::default()
        };
        for (symbol, result) in symbols.iter().zip(results) {
            match result {
                Ok(InstrumentAction::Bought) => report.buys += 1,
                Ok(InstrumentAction::Sold) => report.sells += 1,
                Ok(InstrumentAction::Stopped) => report.stops += 1,
                Ok(InstrumentAction::Idle | InstrumentAction::Handled) => {}
                Err(_) => {
                    error!(symbol = %symbol, "Instrument scan panicked");
                    report.failures += 1;
                }
            }
        }

        CycleOutcome::Completed(report)
    }

    async fn refresh_focus_list(&self) {
        match self.ranker.build().await {
            Ok(ranked) if !ranked.is_empty() => {
                let symbols: Vec<String> = ranked.into_iter().map(|s| s.symbol).collect();
                info!(focus = ?symbols, "Updated focus list");
                self.focus.replace(symbols).await;
            }
            Ok(_) => warn!("Ranking produced no candidates, keeping previous focus list"),
            Err(e) => warn!(error = %e, "Ranking failed, keeping previous focus list"),
        }
    }

    /// Held amount per symbol. Empty when holdings cannot be fetched, so the
    /// cycle still runs signal checks.
    async fn holdings_snapshot(&self) -> HashMap<String, Decimal> {
        match self.gateway.fetch_holdings().await {
            Ok(holdings) => holdings
                .into_iter()
                .map(|h| (h.symbol, h.amount))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to fetch holdings, continuing with signal checks only");
                HashMap::new()
            }
        }
    }

    async fn scan_instrument(
        &self,
        symbol: &str,
        holdings: &HashMap<String, Decimal>,
        hourly: bool,
    ) -> InstrumentAction {
        let held = holdings.get(symbol).copied().unwrap_or(Decimal::ZERO);

        if held > Decimal::ZERO
            && self
                .check_stop(symbol, held, Timeframe::FiveMinutes, self.config.short_stop_candles, "GCR ATR Stop")
                .await
        {
            return InstrumentAction::Stopped;
        }

        let minute = self
            .gateway
            .fetch_candles(symbol, Timeframe::OneMinute, self.config.short_candles)
            .await;
        if minute.len() > self.config.short_min_candles {
            let action = self
                .act_on(symbol, held, &self.panic_strategy, &minute)
                .await;
            if action != InstrumentAction::Idle {
                return action;
            }
        }

        if !hourly {
            return InstrumentAction::Idle;
        }

        if held > Decimal::ZERO
            && self
                .check_stop(symbol, held, Timeframe::OneHour, self.config.long_stop_candles, "Livermore ATR Stop")
                .await
        {
            return InstrumentAction::Stopped;
        }

        let daily = self
            .gateway
            .fetch_candles(symbol, Timeframe::OneDay, self.config.daily_candles)
            .await;
        if daily.len() > self.config.daily_min_candles {
            return self
                .act_on(symbol, held, &self.trend_strategy, &daily)
                .await;
        }

        InstrumentAction::Idle
    }

    /// ATR stop on `timeframe` for a held, tracked position. Sells and
    /// forgets the entry when breached.
    async fn check_stop(
        &self,
        symbol: &str,
        held: Decimal,
        timeframe: Timeframe,
        limit: usize,
        strategy: &str,
    ) -> bool {
        let Some(entry) = self.entries.get(symbol).await else {
            return false;
        };

        let candles = self.gateway.fetch_candles(symbol, timeframe, limit).await;
        let Some(check) = self.stop.check(entry.entry_price, &candles) else {
            return false;
        };
        self.entries.observe(symbol, check.close).await;

        debug!(
            symbol = %symbol,
            timeframe = %timeframe,
            close = check.close,
            stop = check.stop_price,
            atr = check.atr,
            "ATR stop check"
        );

        if !check.breached {
            return false;
        }

        let reason = format!(
            "ATR Stop hit ({}, k={}): close {} <= stop {:.4}",
            timeframe,
            self.stop.multiplier(),
            check.close,
            check.stop_price
        );
        let intent = OrderIntent {
            symbol,
            reason: &reason,
            strategy,
            price: Some(check.close),
        };
        self.executor.sell(intent, held).await;
        self.entries.clear(symbol).await;
        true
    }

    /// Evaluate `strategy` and act on it. A SELL always forgets the entry and
    /// sells whatever is held; a BUY on an unheld instrument places an order.
    /// Either one ends the instrument's scan for this cycle.
    async fn act_on(
        &self,
        symbol: &str,
        held: Decimal,
        strategy: &dyn Strategy,
        candles: &[Candle],
    ) -> InstrumentAction {
        let verdict = strategy.evaluate(candles);
        let last_close = candles.last().map(|c| c.close);

        debug!(
            symbol = %symbol,
            strategy = strategy.name(),
            signal = %verdict.signal,
            confidence = verdict.confidence,
            "Strategy verdict"
        );

        match verdict.signal {
            Signal::Sell => {
                self.entries.clear(symbol).await;
                if held <= Decimal::ZERO {
                    return InstrumentAction::Handled;
                }
                let intent = OrderIntent {
                    symbol,
                    reason: &verdict.reason,
                    strategy: strategy.name(),
                    price: last_close,
                };
                self.executor.sell(intent, held).await;
                InstrumentAction::Sold
            }
            Signal::Buy if held <= Decimal::ZERO => {
                let intent = OrderIntent {
                    symbol,
                    reason: &verdict.reason,
                    strategy: strategy.name(),
                    price: last_close,
                };
                if self.executor.buy(intent, self.config.buy_cost).await.is_none() {
                    return InstrumentAction::Handled;
                }
                if let Some(price) = last_close.filter(|p| *p > 0.0) {
                    self.entries.record(symbol, price).await;
                }
                InstrumentAction::Bought
            }
            _ => InstrumentAction::Idle,
        }
    }
}
