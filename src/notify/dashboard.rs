//! Posts signals and trades to the web dashboard.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::models::{DecisionEvent, ExitSummary};

use super::DecisionSink;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewsPayload<'a> {
    text: &'a str,
    symbol: &'a str,
    is_important: bool,
}

#[derive(Debug, Serialize)]
struct TradePayload<'a> {
    symbol: &'a str,
    action: &'a str,
    amount: Decimal,
    price: f64,
}

/// Fire-and-forget dashboard client. Delivery failures are logged at debug
/// level and never reported to the caller.
pub struct DashboardNotifier {
    client: Client,
    base_url: String,
}

impl DashboardNotifier {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<T: Serialize + Sync>(&self, kind: &str, payload: &T) {
        let url = format!("{}/api/{}", self.base_url, kind);
        match self.client.post(&url).json(payload).send().await {
            Ok(response) if !response.status().is_success() => {
                debug!(url = %url, status = %response.status(), "Dashboard rejected event");
            }
            Ok(_) => {}
            Err(e) => debug!(url = %url, error = %e, "Dashboard unreachable"),
        }
    }
}

/// Ticker without the quote prefix (`"KRW-SOL"` -> `"SOL"`).
fn ticker(symbol: &str) -> &str {
    symbol.split_once('-').map(|(_, t)| t).unwrap_or(symbol)
}

#[async_trait]
impl DecisionSink for DashboardNotifier {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    async fn on_signal(&self, symbol: &str, text: &str) -> Result<()> {
        let payload = NewsPayload {
            text,
            symbol: ticker(symbol),
            is_important: true,
        };
        self.post("news", &payload).await;
        Ok(())
    }

    async fn on_decision(&self, event: &DecisionEvent) -> Result<()> {
        let payload = TradePayload {
            symbol: &event.symbol,
            action: event.action.as_str(),
            amount: event.amount,
            price: event.price.unwrap_or(0.0),
        };
        self.post("trade", &payload).await;
        Ok(())
    }

    async fn on_exit(&self, summary: &ExitSummary) -> Result<()> {
        let text = format!(
            "[Exit Ladder] {} closed by {} (PnL {:.2}%, DD {:.2}%, {}s)",
            summary.symbol,
            summary.reason,
            summary.pnl_pct,
            summary.drawdown_pct,
            summary.elapsed_ms / 1000
        );
        let payload = NewsPayload {
            text: &text,
            symbol: ticker(&summary.symbol),
            is_important: false,
        };
        self.post("news", &payload).await;
        Ok(())
    }
}
