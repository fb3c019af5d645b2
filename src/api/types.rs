//! Wire types for the Upbit REST API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Candle from /v1/candles/minutes/{unit} and /v1/candles/days.
#[derive(Debug, Clone, Deserialize)]
pub struct CandleResponse {
    pub market: String,
    /// Bar open time, UTC, without offset (e.g. "2024-01-01T00:00:00")
    pub candle_date_time_utc: String,
    pub opening_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub trade_price: f64,
    #[serde(default)]
    pub candle_acc_trade_volume: f64,
}

/// Market listing from /v1/market/all.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketResponse {
    pub market: String,
    #[serde(default)]
    pub korean_name: String,
    #[serde(default)]
    pub english_name: String,
}

/// Ticker from /v1/ticker.
#[derive(Debug, Clone, Deserialize)]
pub struct TickerResponse {
    pub market: String,
    pub trade_price: f64,
}

/// Account balance from /v1/accounts.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub currency: String,
    pub balance: Decimal,
    #[serde(default)]
    pub locked: Decimal,
    #[serde(default)]
    pub avg_buy_price: Decimal,
    #[serde(default)]
    pub unit_currency: String,
}

/// Body for POST /v1/orders.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub market: String,
    /// "bid" or "ask"
    pub side: String,
    /// "price" for market buys by cost, "market" for market sells by volume
    pub ord_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
}

impl OrderRequest {
    pub fn market_buy(market: &str, cost: Decimal) -> Self {
        Self {
            market: market.to_string(),
            side: "bid".to_string(),
            ord_type: "price".to_string(),
            price: Some(cost.normalize().to_string()),
            volume: None,
        }
    }

    pub fn market_sell(market: &str, amount: Decimal) -> Self {
        Self {
            market: market.to_string(),
            side: "ask".to_string(),
            ord_type: "market".to_string(),
            price: None,
            volume: Some(amount.normalize().to_string()),
        }
    }

    /// Url-encoded parameter string the request signature hashes.
    pub fn query_string(&self) -> String {
        let mut params = vec![
            format!("market={}", self.market),
            format!("side={}", self.side),
            format!("ord_type={}", self.ord_type),
        ];
        if let Some(price) = &self.price {
            params.push(format!("price={}", price));
        }
        if let Some(volume) = &self.volume {
            params.push(format!("volume={}", volume));
        }
        params.join("&")
    }
}

/// Response from POST /v1/orders.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    pub uuid: String,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub ord_type: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub market: String,
}
