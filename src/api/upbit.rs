//! Upbit REST client implementing [`ExchangeGateway`].

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{NaiveDateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256, Sha512};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Candle, Timeframe};

use super::gateway::{ExchangeGateway, Holding};
use super::types::*;

const UPBIT_API_BASE: &str = "https://api.upbit.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_CANDLES_PER_REQUEST: usize = 200;
const RATE_LIMIT_RETRY_WINDOW: Duration = Duration::from_secs(5);
const QUOTE_CURRENCY: &str = "KRW";

/// Smallest order value Upbit accepts in the KRW market.
pub const MIN_ORDER_KRW: Decimal = dec!(5000);

/// API key pair for private endpoints.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl Credentials {
    /// Read `UPBIT_ACCESS_KEY` / `UPBIT_SECRET_KEY`; `None` if either is unset.
    pub fn from_env() -> Option<Self> {
        let access_key = std::env::var("UPBIT_ACCESS_KEY").ok()?;
        let secret_key = std::env::var("UPBIT_SECRET_KEY").ok()?;
        if access_key.is_empty() || secret_key.is_empty() {
            return None;
        }
        Some(Self {
            access_key,
            secret_key,
        })
    }
}

/// Client for Upbit market data and order placement.
pub struct UpbitClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl UpbitClient {
    /// Create a client. Without credentials only public endpoints work.
    pub fn new(credentials: Option<Credentials>) -> Result<Self> {
        Self::with_base_url(UPBIT_API_BASE.to_string(), credentials)
    }

    /// Create with custom base URL (for testing).
    pub fn with_base_url(base_url: String, credentials: Option<Credentials>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// Client configured from the environment.
    pub fn from_env() -> Result<Self> {
        let credentials = Credentials::from_env();
        if credentials.is_none() {
            warn!("UPBIT_ACCESS_KEY/UPBIT_SECRET_KEY not set, private endpoints disabled");
        }
        Self::new(credentials)
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Bearer token for a private request; `query` is the url-encoded
    /// parameter string when the request carries parameters.
    fn authorization(&self, query: Option<&str>) -> Result<String> {
        let credentials = self
            .credentials
            .as_ref()
            .context("Upbit credentials not configured")?;

        let mut claims = serde_json::json!({
            "access_key": credentials.access_key,
            "nonce": Uuid::new_v4().to_string(),
        });
        if let Some(query) = query {
            claims["query_hash"] = serde_json::Value::String(hex::encode(Sha512::digest(query.as_bytes())));
            claims["query_hash_alg"] = serde_json::Value::String("SHA512".to_string());
        }

        let token = sign_jwt(&claims, &credentials.secret_key)?;
        Ok(format!("Bearer {}", token))
    }

    /// Send a request, retrying while the exchange answers 429.
    async fn send_json<T, F>(&self, label: &str, build: F) -> Result<T>
    where
        T: DeserializeOwned + Send,
        F: Fn() -> Result<RequestBuilder> + Send + Sync,
    {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(200))
            .with_max_elapsed_time(Some(RATE_LIMIT_RETRY_WINDOW))
            .build();

        backoff::future::retry(policy, || async {
            let request = build().map_err(backoff::Error::permanent)?;
            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to send {} request", label))
                .map_err(backoff::Error::permanent)?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                debug!(request = label, "Rate limited, backing off");
                return Err(backoff::Error::transient(anyhow!(
                    "{} request rate limited",
                    label
                )));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(backoff::Error::permanent(anyhow!(
                    "{} request failed: {} - {}",
                    label,
                    status,
                    body
                )));
            }

            response
                .json::<T>()
                .await
                .with_context(|| format!("Failed to parse {} response", label))
                .map_err(backoff::Error::permanent)
        })
        .await
    }

    async fn get_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Candle>> {
        let url = match timeframe.minutes() {
            Some(unit) => format!("{}/v1/candles/minutes/{}", self.base_url, unit),
            None => format!("{}/v1/candles/days", self.base_url),
        };
        let count = limit.clamp(1, MAX_CANDLES_PER_REQUEST).to_string();

        debug!(symbol = %symbol, timeframe = %timeframe, count = %count, "Fetching candles");

        let items: Vec<CandleResponse> = self
            .send_json("candles", || {
                Ok(self
                    .client
                    .get(&url)
                    .query(&[("market", symbol), ("count", count.as_str())]))
            })
            .await?;

        Ok(to_candles(items))
    }

    async fn submit_order(&self, order: OrderRequest) -> Result<Option<String>> {
        let url = format!("{}/v1/orders", self.base_url);
        let query = order.query_string();

        let response: OrderResponse = self
            .send_json("order", || {
                let token = self.authorization(Some(&query))?;
                Ok(self
                    .client
                    .post(&url)
                    .header("Authorization", token)
                    .json(&order))
            })
            .await?;

        info!(
            market = %order.market,
            side = %order.side,
            uuid = %response.uuid,
            "Order accepted"
        );

        Ok(Some(response.uuid))
    }
}

#[async_trait]
impl ExchangeGateway for UpbitClient {
    async fn fetch_candles(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Vec<Candle> {
        match self.get_candles(symbol, timeframe, limit).await {
            Ok(candles) => candles,
            Err(e) => {
                warn!(symbol = %symbol, timeframe = %timeframe, error = %e, "Candle fetch failed");
                Vec::new()
            }
        }
    }

    async fn fetch_holdings(&self) -> Result<Vec<Holding>> {
        let url = format!("{}/v1/accounts", self.base_url);

        let accounts: Vec<AccountResponse> = self
            .send_json("accounts", || {
                let token = self.authorization(None)?;
                Ok(self.client.get(&url).header("Authorization", token))
            })
            .await?;

        let holdings = accounts
            .into_iter()
            .filter(|a| a.currency != QUOTE_CURRENCY && a.balance > Decimal::ZERO)
            .map(|a| {
                let quote = if a.unit_currency.is_empty() {
                    QUOTE_CURRENCY
                } else {
                    a.unit_currency.as_str()
                };
                Holding {
                    symbol: format!("{}-{}", quote, a.currency),
                    amount: a.balance,
                }
            })
            .collect();

        Ok(holdings)
    }

    async fn place_market_buy(&self, symbol: &str, cost: Decimal) -> Result<Option<String>> {
        if cost < MIN_ORDER_KRW {
            warn!(symbol = %symbol, cost = %cost, min = %MIN_ORDER_KRW, "Buy below exchange minimum, skipping");
            return Ok(None);
        }
        self.submit_order(OrderRequest::market_buy(symbol, cost)).await
    }

    async fn place_market_sell(&self, symbol: &str, amount: Decimal) -> Result<Option<String>> {
        if amount <= Decimal::ZERO {
            return Ok(None);
        }
        self.submit_order(OrderRequest::market_sell(symbol, amount)).await
    }

    async fn fetch_all_tradable_symbols(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1/market/all", self.base_url);

        let markets: Vec<MarketResponse> = self
            .send_json("markets", || Ok(self.client.get(&url)))
            .await?;

        Ok(markets.into_iter().map(|m| m.market).collect())
    }

    async fn fetch_latest_price(&self, symbol: &str) -> Result<Option<f64>> {
        let url = format!("{}/v1/ticker", self.base_url);

        let tickers: Vec<TickerResponse> = self
            .send_json("ticker", || Ok(self.client.get(&url).query(&[("markets", symbol)])))
            .await?;

        Ok(tickers.first().map(|t| t.trade_price))
    }
}

/// Convert the exchange's newest-first candles into oldest-first bars.
fn to_candles(items: Vec<CandleResponse>) -> Vec<Candle> {
    let mut candles: Vec<Candle> = items
        .into_iter()
        .filter_map(|c| {
            let naive = NaiveDateTime::parse_from_str(&c.candle_date_time_utc, "%Y-%m-%dT%H:%M:%S").ok()?;
            Some(Candle::new(
                Utc.from_utc_datetime(&naive),
                c.opening_price,
                c.high_price,
                c.low_price,
                c.trade_price,
                c.candle_acc_trade_volume,
            ))
        })
        .collect();

    candles.sort_by_key(|c| c.timestamp);
    candles.dedup_by_key(|c| c.timestamp);
    candles
}

/// HS256 JSON Web Token over `claims`.
fn sign_jwt(claims: &serde_json::Value, secret: &str) -> Result<String> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).context("Failed to encode JWT claims")?);
    let signing_input = format!("{}.{}", header, payload);

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow!("Invalid secret key: {}", e))?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature))
}
