//! Opportunistic entries from trigger events and the exit ladder that
//! watches each one.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ExchangeGateway;
use crate::models::{ExitSummary, PositionRiskState, TriggerEvent};

use super::config::LadderConfig;
use super::executor::{OrderExecutor, OrderIntent};
use super::risk::{ExitLadder, LadderExit};
use super::state::{ActiveGuard, ActivePositions};

const STRATEGY_NAME: &str = "News Exit Ladder";

/// Buys on trigger events and runs one exit-ladder monitor per position.
pub struct TriggerHandler {
    gateway: Arc<dyn ExchangeGateway>,
    executor: Arc<OrderExecutor>,
    active: Arc<ActivePositions>,
    ladder: ExitLadder,
    config: LadderConfig,
    quote_prefix: String,
    cancel: CancellationToken,
}

impl TriggerHandler {
    pub fn new(
        gateway: Arc<dyn ExchangeGateway>,
        executor: Arc<OrderExecutor>,
        active: Arc<ActivePositions>,
        config: LadderConfig,
        quote_prefix: &str,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            gateway,
            executor,
            active,
            ladder: ExitLadder::new(&config),
            config,
            quote_prefix: quote_prefix.to_string(),
            cancel,
        }
    }

    /// Consume trigger events until the channel closes or the token is
    /// cancelled. Open monitors are stopped by the same token.
    pub async fn run(self: Arc<Self>, mut triggers: mpsc::Receiver<TriggerEvent>) {
        info!("Trigger handler started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = triggers.recv() => match event {
                    Some(event) => {
                        self.handle(event).await;
                    }
                    None => break,
                },
            }
        }

        info!(active = self.active.len(), "Trigger handler stopped");
    }

    /// Accept one trigger: claim the symbol, buy, and spawn its monitor.
    /// Returns the monitor task when one was started.
    pub async fn handle(self: &Arc<Self>, event: TriggerEvent) -> Option<JoinHandle<()>> {
        let symbol = event.market_symbol(&self.quote_prefix);

        if self.config.is_ignored(&symbol) {
            debug!(symbol = %symbol, "Ignoring trigger for quote/major asset");
            return None;
        }

        let Some(guard) = self.active.try_register(&symbol) else {
            info!(symbol = %symbol, "Exit ladder already active, dropping trigger");
            return None;
        };

        info!(symbol = %symbol, text = %event.raw_text, "Trigger accepted");
        if let Err(e) = self.executor.sink().on_signal(&symbol, &event.raw_text).await {
            debug!(symbol = %symbol, error = %e, "Failed to forward trigger text");
        }

        let intent = OrderIntent {
            symbol: &symbol,
            reason: "Trigger event",
            strategy: STRATEGY_NAME,
            price: None,
        };
        self.executor.buy(intent, self.config.entry_cost).await?;

        let handler = Arc::clone(self);
        Some(tokio::spawn(async move {
            handler.watch(guard).await;
        }))
    }

    /// Poll the price until a ladder rung fires, then sell everything held.
    /// The guard is released when this returns, on every path.
    async fn watch(&self, guard: ActiveGuard) {
        let symbol = guard.symbol().to_string();

        let entry_price = match self.gateway.fetch_latest_price(&symbol).await {
            Ok(Some(price)) if price > 0.0 => price,
            Ok(_) => {
                warn!(symbol = %symbol, "No entry price, abandoning exit ladder");
                return;
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Entry price fetch failed, abandoning exit ladder");
                return;
            }
        };

        info!(symbol = %symbol, entry_price, "Exit ladder armed");

        let mut state = PositionRiskState::new(entry_price);
        let started = Instant::now();

        let exit = loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!(symbol = %symbol, "Exit ladder cancelled");
                    return;
                }
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
            }

            let price = match self.gateway.fetch_latest_price(&symbol).await {
                Ok(Some(price)) => price,
                Ok(None) => continue,
                Err(e) => {
                    debug!(symbol = %symbol, error = %e, "Price poll failed");
                    continue;
                }
            };

            if let Some(exit) = self.ladder.tick(&mut state, price, started.elapsed()) {
                break exit;
            }
        };

        self.close(&symbol, exit, started.elapsed().as_millis() as u64)
            .await;
    }

    async fn close(&self, symbol: &str, exit: LadderExit, elapsed_ms: u64) {
        info!(
            symbol = %symbol,
            reason = %exit.reason,
            pnl_pct = exit.pnl_pct,
            drawdown_pct = exit.drawdown_pct,
            "Exit ladder fired"
        );

        let amount = match self.gateway.fetch_holdings().await {
            Ok(holdings) => holdings
                .into_iter()
                .find(|h| h.symbol == symbol)
                .map(|h| h.amount)
                .unwrap_or(Decimal::ZERO),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Holdings fetch failed, cannot size exit");
                Decimal::ZERO
            }
        };

        let reason = format!("{} (PnL {:.2}%)", exit.reason, exit.pnl_pct);
        let intent = OrderIntent {
            symbol,
            reason: &reason,
            strategy: STRATEGY_NAME,
            price: None,
        };
        self.executor.sell(intent, amount).await;

        let summary = ExitSummary {
            symbol: symbol.to_string(),
            reason: exit.reason,
            pnl_pct: exit.pnl_pct,
            drawdown_pct: exit.drawdown_pct,
            elapsed_ms,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.executor.sink().on_exit(&summary).await {
            warn!(symbol = %symbol, error = %e, "Failed to record exit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockGateway;
    use crate::models::{ExitReason, TradeSide};
    use crate::notify::recording::RecordingSink;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    struct Harness {
        gateway: Arc<MockGateway>,
        sink: Arc<RecordingSink>,
        active: Arc<ActivePositions>,
        cancel: CancellationToken,
        handler: Arc<TriggerHandler>,
    }

    fn harness() -> Harness {
        let gateway = Arc::new(MockGateway::new());
        let sink = Arc::new(RecordingSink::default());
        let active = ActivePositions::new();
        let cancel = CancellationToken::new();
        let executor = Arc::new(OrderExecutor::new(gateway.clone(), sink.clone(), false));
        let config = LadderConfig {
            poll_interval_ms: 5,
            ..LadderConfig::default()
        };
        let handler = Arc::new(TriggerHandler::new(
            gateway.clone(),
            executor,
            active.clone(),
            config,
            "KRW-",
            cancel.clone(),
        ));
        Harness {
            gateway,
            sink,
            active,
            cancel,
            handler,
        }
    }

    fn trigger(symbol: &str) -> TriggerEvent {
        TriggerEvent {
            symbol: symbol.to_string(),
            raw_text: format!("Binance will list {}", symbol),
        }
    }

    #[tokio::test]
    async fn test_trail_stop_sells_full_holding() {
        let h = harness();
        h.gateway.set_prices("KRW-PNUT", &[100.0, 110.0, 106.0]);
        h.gateway.set_holding("KRW-PNUT", dec!(480.5));

        let monitor = h.handler.handle(trigger("pnut")).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), monitor)
            .await
            .unwrap()
            .unwrap();

        let orders = h.gateway.orders();
        assert_eq!(orders.len(), 2);
        assert_eq!((orders[0].side, orders[0].amount), (TradeSide::Buy, dec!(50000)));
        assert_eq!((orders[1].side, orders[1].amount), (TradeSide::Sell, dec!(480.5)));

        let exits = h.sink.exits();
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].reason, ExitReason::TrailStop);
        assert!((exits[0].pnl_pct - 6.0).abs() < 1e-9);
        assert!(!h.active.contains("KRW-PNUT"));
    }

    #[tokio::test]
    async fn test_duplicate_trigger_is_dropped() {
        let h = harness();
        h.gateway.set_prices("KRW-ABC", &[100.0]);

        let first = h.handler.handle(trigger("ABC")).await;
        assert!(first.is_some());
        assert!(h.handler.handle(trigger("KRW-ABC")).await.is_none());
        assert_eq!(h.gateway.orders().len(), 1);

        h.cancel.cancel();
        first.unwrap().await.unwrap();
        assert!(!h.active.contains("KRW-ABC"));
    }

    #[tokio::test]
    async fn test_ignored_symbols_never_trade() {
        let h = harness();
        assert!(h.handler.handle(trigger("USDT")).await.is_none());
        assert!(h.handler.handle(trigger("btc")).await.is_none());
        assert!(h.gateway.orders().is_empty());
    }

    #[tokio::test]
    async fn test_failed_buy_releases_symbol() {
        let h = harness();
        h.gateway.fail_orders_for("KRW-XYZ");

        assert!(h.handler.handle(trigger("XYZ")).await.is_none());
        assert!(!h.active.contains("KRW-XYZ"));
    }

    #[tokio::test]
    async fn test_missing_entry_price_ends_monitor() {
        let h = harness();

        let monitor = h.handler.handle(trigger("NOPE")).await.unwrap();
        monitor.await.unwrap();

        assert_eq!(h.gateway.orders().len(), 1);
        assert!(h.sink.exits().is_empty());
        assert_eq!(h.active.len(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let h = harness();
        let (tx, rx) = mpsc::channel(4);
        let task = tokio::spawn(Arc::clone(&h.handler).run(rx));

        tx.send(trigger("USDC")).await.unwrap();
        h.cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert!(h.gateway.orders().is_empty());
    }
}
