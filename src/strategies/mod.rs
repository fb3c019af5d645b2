//! Signal-generating strategies and the rule that reconciles them.

mod brain;
mod panic_reversion;
mod synthesizer;
mod trend_breakout;
mod volume_breakout;

pub use brain::Brain;
pub use panic_reversion::PanicReversionStrategy;
pub use synthesizer::synthesize;
pub use trend_breakout::TrendBreakoutStrategy;
pub use volume_breakout::VolumeBreakoutStrategy;

use crate::models::{Candle, StrategyVerdict};

/// A stateless evaluator producing one verdict for the latest candle.
pub trait Strategy: Send + Sync {
    /// Display name used in logs and decision events.
    fn name(&self) -> &'static str;

    /// Fewest candles the strategy needs before it can say anything but WAIT.
    fn min_candles(&self) -> usize;

    /// Evaluate the latest bar of `candles` (oldest first).
    fn evaluate(&self, candles: &[Candle]) -> StrategyVerdict;
}

/// Highest value of `values[len - 1 - lookback .. len - 1]`, i.e. the
/// `lookback` samples before the current one.
pub(crate) fn prior_max(values: &[f64], lookback: usize) -> Option<f64> {
    let len = values.len();
    if lookback == 0 || len < lookback + 1 {
        return None;
    }
    Some(
        values[len - 1 - lookback..len - 1]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max),
    )
}
