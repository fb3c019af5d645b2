//! Relative-strength ranking of the tradable universe against a benchmark.

use anyhow::{bail, Context, Result};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::ExchangeGateway;
use crate::models::{Candle, Timeframe};

use super::config::RankerConfig;

/// Return over two windows, each minus the benchmark's return over the same
/// window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelativeStrength {
    pub symbol: String,
    pub rs_long: f64,
    pub rs_short: f64,
}

/// Fractional return from `lookback` candles ago to the latest close.
/// `None` without enough history or with a non-positive base price.
pub fn calc_return(candles: &[Candle], lookback: usize) -> Option<f64> {
    if candles.len() <= lookback {
        return None;
    }
    let last = candles[candles.len() - 1].close;
    let prev = candles[candles.len() - 1 - lookback].close;
    if prev <= 0.0 {
        return None;
    }
    Some(last / prev - 1.0)
}

/// Keep the `top_n` strongest by `rs_long`, then the `top_m` strongest of
/// those by `rs_short`.
pub fn rank_focus_list(mut scores: Vec<RelativeStrength>, top_n: usize, top_m: usize) -> Vec<RelativeStrength> {
    scores.sort_by(|a, b| b.rs_long.partial_cmp(&a.rs_long).unwrap_or(Ordering::Equal));
    scores.truncate(top_n);
    scores.sort_by(|a, b| b.rs_short.partial_cmp(&a.rs_short).unwrap_or(Ordering::Equal));
    scores.truncate(top_m);
    scores
}

pub struct WatchlistRanker {
    gateway: Arc<dyn ExchangeGateway>,
    config: RankerConfig,
}

impl WatchlistRanker {
    pub fn new(gateway: Arc<dyn ExchangeGateway>, config: RankerConfig) -> Self {
        Self { gateway, config }
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    /// Score every quote-market instrument. Fails when the market list or
    /// the benchmark history is unavailable.
    pub async fn score_universe(&self) -> Result<Vec<RelativeStrength>> {
        let markets = self
            .gateway
            .fetch_all_tradable_symbols()
            .await
            .context("Failed to fetch tradable symbols")?;

        let universe: Vec<String> = markets
            .into_iter()
            .filter(|m| m.starts_with(&self.config.quote_prefix) && *m != self.config.benchmark)
            .collect();

        let benchmark = self
            .gateway
            .fetch_candles(&self.config.benchmark, Timeframe::OneHour, self.config.candles)
            .await;
        let (Some(bench_long), Some(bench_short)) = (
            calc_return(&benchmark, self.config.long_lookback),
            calc_return(&benchmark, self.config.short_lookback),
        ) else {
            bail!(
                "Benchmark {} has insufficient history ({} candles)",
                self.config.benchmark,
                benchmark.len()
            );
        };

        debug!(candidates = universe.len(), "Scoring relative strength");

        let gateway = &self.gateway;
        let config = &self.config;
        let scores: Vec<Option<RelativeStrength>> = stream::iter(universe)
            .map(|symbol| async move {
                let candles = gateway
                    .fetch_candles(&symbol, Timeframe::OneHour, config.candles)
                    .await;
                let long = calc_return(&candles, config.long_lookback)?;
                let short = calc_return(&candles, config.short_lookback)?;
                Some(RelativeStrength {
                    symbol,
                    rs_long: long - bench_long,
                    rs_short: short - bench_short,
                })
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        Ok(scores.into_iter().flatten().collect())
    }

    /// Build a fresh focus list, strongest first.
    pub async fn build(&self) -> Result<Vec<RelativeStrength>> {
        let scores = self.score_universe().await?;
        let scored = scores.len();
        let focus = rank_focus_list(scores, self.config.top_n, self.config.top_m);

        info!(
            scored,
            focus = ?focus.iter().map(|s| s.symbol.as_str()).collect::<Vec<_>>(),
            "Relative-strength ranking complete"
        );

        Ok(focus)
    }
}
