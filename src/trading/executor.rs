//! Turns BUY/SELL actions into gateway orders and reports the ones that land.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::ExchangeGateway;
use crate::models::{DecisionEvent, TradeSide};
use crate::notify::DecisionSink;

/// What to trade and why.
#[derive(Debug, Clone)]
pub struct OrderIntent<'a> {
    pub symbol: &'a str,
    pub reason: &'a str,
    pub strategy: &'a str,
    /// Reference price, if the caller has one
    pub price: Option<f64>,
}

/// Places market orders and forwards accepted ones to the sinks.
///
/// Order failures are logged and reported as `None`; they never propagate.
pub struct OrderExecutor {
    gateway: Arc<dyn ExchangeGateway>,
    sink: Arc<dyn DecisionSink>,
    dry_run: bool,
}

impl OrderExecutor {
    pub fn new(gateway: Arc<dyn ExchangeGateway>, sink: Arc<dyn DecisionSink>, dry_run: bool) -> Self {
        Self {
            gateway,
            sink,
            dry_run,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn sink(&self) -> &Arc<dyn DecisionSink> {
        &self.sink
    }

    /// Market buy spending `cost`. Returns the order id when placed.
    pub async fn buy(&self, intent: OrderIntent<'_>, cost: Decimal) -> Option<String> {
        info!(
            symbol = %intent.symbol,
            strategy = %intent.strategy,
            reason = %intent.reason,
            cost = %cost,
            "BUY signal"
        );
        self.announce(&intent, TradeSide::Buy).await;

        let result = if self.dry_run {
            info!(symbol = %intent.symbol, cost = %cost, "[DRY RUN] Would place market buy");
            Ok(Some(dry_run_order_id()))
        } else {
            self.gateway.place_market_buy(intent.symbol, cost).await
        };

        self.settle(intent, TradeSide::Buy, cost, result).await
    }

    /// Market sell of `amount`. No order is placed when `amount` is not
    /// positive.
    pub async fn sell(&self, intent: OrderIntent<'_>, amount: Decimal) -> Option<String> {
        if amount <= Decimal::ZERO {
            warn!(symbol = %intent.symbol, strategy = %intent.strategy, "SELL signal but nothing held");
            return None;
        }

        info!(
            symbol = %intent.symbol,
            strategy = %intent.strategy,
            reason = %intent.reason,
            amount = %amount,
            "SELL signal"
        );
        self.announce(&intent, TradeSide::Sell).await;

        let result = if self.dry_run {
            info!(symbol = %intent.symbol, amount = %amount, "[DRY RUN] Would place market sell");
            Ok(Some(dry_run_order_id()))
        } else {
            self.gateway.place_market_sell(intent.symbol, amount).await
        };

        self.settle(intent, TradeSide::Sell, amount, result).await
    }

    async fn announce(&self, intent: &OrderIntent<'_>, side: TradeSide) {
        let text = format!(
            "[{}] {} {} Signal Detected! {}",
            intent.strategy, intent.symbol, side, intent.reason
        );
        // Best effort; the order goes out either way
        let _ = self.sink.on_signal(intent.symbol, &text).await;
    }

    async fn settle(
        &self,
        intent: OrderIntent<'_>,
        side: TradeSide,
        amount: Decimal,
        result: anyhow::Result<Option<String>>,
    ) -> Option<String> {
        let order_id = match result {
            Ok(Some(id)) => id,
            Ok(None) => {
                warn!(symbol = %intent.symbol, side = %side, "Order not placed");
                return None;
            }
            Err(e) => {
                error!(symbol = %intent.symbol, side = %side, error = %e, "Order execution failed");
                return None;
            }
        };

        info!(symbol = %intent.symbol, side = %side, order_id = %order_id, "Order placed");

        let event = DecisionEvent {
            symbol: intent.symbol.to_string(),
            action: side,
            reason: intent.reason.to_string(),
            strategy_name: intent.strategy.to_string(),
            amount,
            price: intent.price,
            order_id: Some(order_id.clone()),
            dry_run: self.dry_run,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.sink.on_decision(&event).await {
            warn!(symbol = %intent.symbol, error = %e, "Failed to record decision");
        }

        Some(order_id)
    }
}

fn dry_run_order_id() -> String {
    format!("dry-run-{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockGateway;
    use crate::notify::recording::RecordingSink;
    use rust_decimal_macros::dec;

    fn intent(symbol: &str) -> OrderIntent<'_> {
        OrderIntent {
            symbol,
            reason: "test",
            strategy: "GCR Reversion",
            price: Some(101.0),
        }
    }

    #[tokio::test]
    async fn test_buy_emits_decision() {
        let gateway = Arc::new(MockGateway::new());
        let sink = Arc::new(RecordingSink::default());
        let executor = OrderExecutor::new(gateway.clone(), sink.clone(), false);

        let order_id = executor.buy(intent("KRW-SOL"), dec!(10000)).await;

        assert!(order_id.is_some());
        assert_eq!(gateway.orders().len(), 1);
        let decisions = sink.decisions();
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].action, TradeSide::Buy);
        assert_eq!(decisions[0].amount, dec!(10000));
        assert_eq!(decisions[0].price, Some(101.0));
        assert_eq!(sink.signals().len(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_skips_gateway() {
        let gateway = Arc::new(MockGateway::new());
        let sink = Arc::new(RecordingSink::default());
        let executor = OrderExecutor::new(gateway.clone(), sink.clone(), true);

        let order_id = executor.sell(intent("KRW-SOL"), dec!(1.5)).await.unwrap();

        assert!(order_id.starts_with("dry-run-"));
        assert!(gateway.orders().is_empty());
        assert!(sink.decisions()[0].dry_run);
    }

    #[tokio::test]
    async fn test_sell_nothing_is_noop() {
        let gateway = Arc::new(MockGateway::new());
        let sink = Arc::new(RecordingSink::default());
        let executor = OrderExecutor::new(gateway.clone(), sink.clone(), false);

        assert!(executor.sell(intent("KRW-SOL"), Decimal::ZERO).await.is_none());
        assert!(gateway.orders().is_empty());
        assert!(sink.signals().is_empty());
    }

    #[tokio::test]
    async fn test_failed_order_is_swallowed() {
        let gateway = Arc::new(MockGateway::new());
        gateway.fail_orders_for("KRW-SOL");
        let sink = Arc::new(RecordingSink::default());
        let executor = OrderExecutor::new(gateway, sink.clone(), false);

        assert!(executor.buy(intent("KRW-SOL"), dec!(10000)).await.is_none());
        assert!(sink.decisions().is_empty());
    }
}
