//! Narrow interface to the exchange: market data in, market orders out.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::{Candle, Timeframe};

/// Balance held in one market.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    /// Market symbol (e.g. "KRW-SOL")
    pub symbol: String,
    /// Base-currency amount available to sell
    pub amount: Decimal,
}

/// Market-data and order-execution gateway.
///
/// Candle fetches never fail: any transport or decode problem yields an
/// empty vector, which strategies treat as insufficient data. Order calls
/// return `Ok(None)` when the exchange (or a pre-check) declines the order.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Up to `limit` most recent candles, oldest first.
    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Vec<Candle>;

    /// Non-zero balances, keyed by market symbol.
    async fn fetch_holdings(&self) -> Result<Vec<Holding>>;

    /// Market buy spending `cost` of the quote currency.
    async fn place_market_buy(&self, symbol: &str, cost: Decimal) -> Result<Option<String>>;

    /// Market sell of `amount` base currency.
    async fn place_market_sell(&self, symbol: &str, amount: Decimal) -> Result<Option<String>>;

    /// Every market symbol the exchange lists.
    async fn fetch_all_tradable_symbols(&self) -> Result<Vec<String>>;

    /// Last traded price.
    async fn fetch_latest_price(&self, symbol: &str) -> Result<Option<f64>>;
}
