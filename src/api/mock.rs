//! Scripted in-memory gateway for tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use crate::models::{Candle, Timeframe, TradeSide};

use super::gateway::{ExchangeGateway, Holding};

#[derive(Debug, Clone, PartialEq)]
pub struct MockOrder {
    pub symbol: String,
    pub side: TradeSide,
    pub amount: Decimal,
}

/// Gateway whose responses are set up by the test. Price scripts are
/// consumed one value per call, the last value repeating.
#[derive(Default)]
pub struct MockGateway {
    candles: Mutex<HashMap<(String, Timeframe), Vec<Candle>>>,
    holdings: Mutex<Vec<Holding>>,
    prices: Mutex<HashMap<String, VecDeque<f64>>>,
    symbols: Mutex<Vec<String>>,
    orders: Mutex<Vec<MockOrder>>,
    candle_requests: Mutex<Vec<(String, Timeframe)>>,
    failing_orders: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
    fail_holdings: Mutex<bool>,
    fail_symbols: Mutex<bool>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_candles(&self, symbol: &str, timeframe: Timeframe, candles: Vec<Candle>) {
        self.candles
            .lock()
            .unwrap()
            .insert((symbol.to_string(), timeframe), candles);
    }

    pub fn set_holding(&self, symbol: &str, amount: Decimal) {
        let mut holdings = self.holdings.lock().unwrap();
        holdings.retain(|h| h.symbol != symbol);
        holdings.push(Holding {
            symbol: symbol.to_string(),
            amount,
        });
    }

    pub fn set_prices(&self, symbol: &str, prices: &[f64]) {
        self.prices
            .lock()
            .unwrap()
            .insert(symbol.to_string(), prices.iter().copied().collect());
    }

    pub fn set_symbols(&self, symbols: &[&str]) {
        *self.symbols.lock().unwrap() = symbols.iter().map(|s| s.to_string()).collect();
    }

    pub fn fail_orders_for(&self, symbol: &str) {
        self.failing_orders.lock().unwrap().insert(symbol.to_string());
    }

    /// Make candle fetches for `symbol` panic.
    pub fn panic_on_candles(&self, symbol: &str) {
        self.panicking.lock().unwrap().insert(symbol.to_string());
    }

    pub fn fail_holdings(&self) {
        *self.fail_holdings.lock().unwrap() = true;
    }

    pub fn fail_symbols(&self) {
        *self.fail_symbols.lock().unwrap() = true;
    }

    pub fn orders(&self) -> Vec<MockOrder> {
        self.orders.lock().unwrap().clone()
    }

    pub fn candle_requests(&self) -> Vec<(String, Timeframe)> {
        self.candle_requests.lock().unwrap().clone()
    }

    fn record_order(&self, symbol: &str, side: TradeSide, amount: Decimal) -> Result<Option<String>> {
        if self.failing_orders.lock().unwrap().contains(symbol) {
            bail!("order rejected for {}", symbol);
        }
        let mut orders = self.orders.lock().unwrap();
        orders.push(MockOrder {
            symbol: symbol.to_string(),
            side,
            amount,
        });
        Ok(Some(format!("mock-{}", orders.len())))
    }
}

#[async_trait]
impl ExchangeGateway for MockGateway {
    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Vec<Candle> {
        self.candle_requests
            .lock()
            .unwrap()
            .push((symbol.to_string(), timeframe));
        let panics = self.panicking.lock().unwrap().contains(symbol);
        if panics {
            panic!("candle feed for {} exploded", symbol);
        }
        let candles = self.candles.lock().unwrap();
        match candles.get(&(symbol.to_string(), timeframe)) {
            Some(series) => {
                let start = series.len().saturating_sub(limit);
                series[start..].to_vec()
            }
            None => Vec::new(),
        }
    }

    async fn fetch_holdings(&self) -> Result<Vec<Holding>> {
        if *self.fail_holdings.lock().unwrap() {
            bail!("holdings unavailable");
        }
        Ok(self.holdings.lock().unwrap().clone())
    }

    async fn place_market_buy(&self, symbol: &str, cost: Decimal) -> Result<Option<String>> {
        self.record_order(symbol, TradeSide::Buy, cost)
    }

    async fn place_market_sell(&self, symbol: &str, amount: Decimal) -> Result<Option<String>> {
        self.record_order(symbol, TradeSide::Sell, amount)
    }

    async fn fetch_all_tradable_symbols(&self) -> Result<Vec<String>> {
        if *self.fail_symbols.lock().unwrap() {
            bail!("market list unavailable");
        }
        Ok(self.symbols.lock().unwrap().clone())
    }

    async fn fetch_latest_price(&self, symbol: &str) -> Result<Option<f64>> {
        let mut prices = self.prices.lock().unwrap();
        let Some(script) = prices.get_mut(symbol) else {
            return Ok(None);
        };
        if script.len() > 1 {
            Ok(script.pop_front())
        } else {
            Ok(script.front().copied())
        }
    }
}
