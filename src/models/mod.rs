//! Data models for candles, signals, positions and trade events.

mod candle;
mod position;
mod signal;
mod trade;

pub use candle::{Candle, Timeframe};
pub use position::{ExitReason, ExitSummary, PositionRiskState};
pub use signal::{Signal, StrategyVerdict};
pub use trade::{market_symbol, DecisionEvent, TradeSide, TriggerEvent};

#[cfg(test)]
pub(crate) use candle::fixtures;
