//! Capitulation mean-reversion strategy.
//!
//! Looks for deeply oversold RSI on a volume blow-off and only buys once the
//! current bar is green. Takes profit when RSI recovers past the midline.

use crate::indicators;
use crate::models::{Candle, Signal, StrategyVerdict};

use super::Strategy;

#[derive(Debug, Clone)]
pub struct PanicReversionStrategy {
    pub min_candles: usize,
    pub rsi_period: usize,
    /// Prior bars averaged for the volume multiple (current bar excluded)
    pub volume_lookback: usize,
    pub extreme_rsi: f64,
    pub extreme_volume_multiple: f64,
    pub panic_rsi: f64,
    pub panic_volume_multiple: f64,
    /// RSI above which the reversion is considered complete
    pub take_profit_rsi: f64,
}

impl Default for PanicReversionStrategy {
    fn default() -> Self {
        Self {
            min_candles: 25,
            rsi_period: 14,
            volume_lookback: 20,
            extreme_rsi: 20.0,
            extreme_volume_multiple: 10.0,
            panic_rsi: 25.0,
            panic_volume_multiple: 5.0,
            take_profit_rsi: 50.0,
        }
    }
}

impl PanicReversionStrategy {
    /// Current volume over the mean of the preceding `volume_lookback` bars.
    fn volume_multiple(&self, candles: &[Candle]) -> f64 {
        let len = candles.len();
        let start = len.saturating_sub(self.volume_lookback + 1);
        let prior = &candles[start..len - 1];
        let avg = if prior.is_empty() {
            0.0
        } else {
            prior.iter().map(|c| c.volume).sum::<f64>() / prior.len() as f64
        };
        // A silent tape has no meaningful average; compare against one unit.
        let avg = if avg > 0.0 { avg } else { 1.0 };
        candles[len - 1].volume / avg
    }
}

impl Strategy for PanicReversionStrategy {
    fn name(&self) -> &'static str {
        "GCR Reversion"
    }

    fn min_candles(&self) -> usize {
        self.min_candles
    }

    fn evaluate(&self, candles: &[Candle]) -> StrategyVerdict {
        if candles.len() < self.min_candles.max(2) {
            return StrategyVerdict::insufficient_data(self.min_candles, candles.len());
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let rsi = indicators::last(&indicators::rsi(&closes, self.rsi_period)).unwrap_or(50.0);
        let volume_multiple = self.volume_multiple(candles);
        let rebounding = candles[candles.len() - 1].is_bullish();

        if rsi < self.panic_rsi {
            if rsi < self.extreme_rsi && volume_multiple >= self.extreme_volume_multiple {
                if !rebounding {
                    return StrategyVerdict::new(
                        Signal::Wait,
                        0.0,
                        format!(
                            "Falling knife: RSI {:.1} and volume {:.1}x but the bar is still red",
                            rsi, volume_multiple
                        ),
                    );
                }

                return StrategyVerdict::new(
                    Signal::Buy,
                    0.99,
                    format!(
                        "LIQUIDATION REVERSAL: RSI {:.1}, volume {:.1}x, green bar",
                        rsi, volume_multiple
                    ),
                );
            }

            if volume_multiple >= self.panic_volume_multiple && rebounding {
                return StrategyVerdict::new(
                    Signal::Buy,
                    0.85,
                    format!(
                        "Panic reversal: RSI {:.1}, volume {:.1}x, price bouncing",
                        rsi, volume_multiple
                    ),
                );
            }
        }

        if rsi > self.take_profit_rsi {
            return StrategyVerdict::new(
                Signal::Sell,
                0.6,
                format!("Mean reversion complete (RSI {:.1} > {}), take profit", rsi, self.take_profit_rsi),
            );
        }

        StrategyVerdict::new(
            Signal::Wait,
            0.5,
            format!("Scanning... RSI {:.1}, volume {:.1}x", rsi, volume_multiple),
        )
    }
}
