//! Outbound trade decision events and inbound trigger events.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A BUY or SELL that was handed to the exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEvent {
    /// Market symbol (e.g. "KRW-SOL")
    pub symbol: String,

    pub action: TradeSide,

    /// Human-readable reason from the strategy or risk rule
    pub reason: String,

    /// Which strategy or stop produced the action
    pub strategy_name: String,

    /// Quote cost for buys, base amount for sells
    pub amount: Decimal,

    /// Reference price when known (last close for scanner entries)
    #[serde(default)]
    pub price: Option<f64>,

    /// Exchange order id (synthetic in dry-run mode)
    #[serde(default)]
    pub order_id: Option<String>,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// External event asking for an immediate opportunistic entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub symbol: String,
    #[serde(default, alias = "rawText")]
    pub raw_text: String,
}

impl TriggerEvent {
    /// Market symbol for the trigger, prefixing bare tickers with the quote
    /// market (`"sol"` -> `"KRW-SOL"`).
    pub fn market_symbol(&self, quote_prefix: &str) -> String {
        market_symbol(&self.symbol, quote_prefix)
    }
}

/// Normalise a ticker or market name to an upper-case market symbol.
pub fn market_symbol(input: &str, quote_prefix: &str) -> String {
    let ticker = input.trim().to_uppercase();
    if ticker.starts_with(quote_prefix) {
        ticker
    } else {
        format!("{}{}", quote_prefix, ticker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_market_symbol() {
        let bare = TriggerEvent {
            symbol: "sol".to_string(),
            raw_text: String::new(),
        };
        assert_eq!(bare.market_symbol("KRW-"), "KRW-SOL");

        let full = TriggerEvent {
            symbol: "KRW-PNUT".to_string(),
            raw_text: String::new(),
        };
        assert_eq!(full.market_symbol("KRW-"), "KRW-PNUT");
    }

    #[test]
    fn test_trigger_accepts_camel_case_text() {
        let event: TriggerEvent =
            serde_json::from_str(r#"{"symbol":"ABC","rawText":"Binance will list ABC"}"#).unwrap();
        assert_eq!(event.raw_text, "Binance will list ABC");
    }
}
