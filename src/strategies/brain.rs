//! Single-instrument analysis: every strategy on the same hourly window,
//! reconciled into one action.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::ExchangeGateway;
use crate::indicators;
use crate::models::{Signal, StrategyVerdict, Timeframe};

use super::{
    synthesize, PanicReversionStrategy, Strategy, TrendBreakoutStrategy, VolumeBreakoutStrategy,
};

const ANALYSIS_TIMEFRAME: Timeframe = Timeframe::OneHour;
const ANALYSIS_CANDLES: usize = 100;
const MIN_ANALYSIS_CANDLES: usize = 50;
const CONTEXT_EMA_PERIOD: usize = 20;

/// Verdicts of all three strategies plus the synthesized decision.
#[derive(Debug, Clone, Serialize)]
pub struct BrainReport {
    pub symbol: String,
    pub last_close: f64,
    /// EMA of hourly closes, shown next to the price for context
    pub ema: Option<f64>,
    pub decision: Signal,
    pub trend: StrategyVerdict,
    pub breakout: StrategyVerdict,
    pub panic: StrategyVerdict,
}

pub struct Brain {
    gateway: Arc<dyn ExchangeGateway>,
    trend: TrendBreakoutStrategy,
    breakout: VolumeBreakoutStrategy,
    panic: PanicReversionStrategy,
}

impl Brain {
    pub fn new(gateway: Arc<dyn ExchangeGateway>) -> Self {
        Self {
            gateway,
            trend: TrendBreakoutStrategy::default(),
            breakout: VolumeBreakoutStrategy::default(),
            panic: PanicReversionStrategy::default(),
        }
    }

    /// Analyze `symbol`. Returns `None` when the exchange has fewer than
    /// 50 hourly candles for it. Never places orders.
    pub async fn analyze(&self, symbol: &str) -> Option<BrainReport> {
        let candles = self
            .gateway
            .fetch_candles(symbol, ANALYSIS_TIMEFRAME, ANALYSIS_CANDLES)
            .await;

        if candles.len() < MIN_ANALYSIS_CANDLES {
            warn!(
                symbol = %symbol,
                candles = candles.len(),
                required = MIN_ANALYSIS_CANDLES,
                "Not enough history to analyze"
            );
            return None;
        }

        let trend = self.trend.evaluate(&candles);
        let breakout = self.breakout.evaluate(&candles);
        let panic = self.panic.evaluate(&candles);

        for (name, verdict) in [
            (self.trend.name(), &trend),
            (self.breakout.name(), &breakout),
            (self.panic.name(), &panic),
        ] {
            info!(
                symbol = %symbol,
                strategy = name,
                signal = %verdict.signal,
                confidence = verdict.confidence,
                reason = %verdict.reason,
                "Strategy verdict"
            );
        }

        let decision = synthesize(trend.signal, breakout.signal, panic.signal);
        info!(symbol = %symbol, decision = %decision, "Final decision");

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let ema = indicators::last(&indicators::ema(&closes, CONTEXT_EMA_PERIOD));

        Some(BrainReport {
            symbol: symbol.to_string(),
            last_close: closes[closes.len() - 1],
            ema,
            decision,
            trend,
            breakout,
            panic,
        })
    }
}
