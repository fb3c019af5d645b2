//! Volume-confirmed breakout strategy for instruments already in an uptrend.

use crate::indicators;
use crate::models::{Candle, Signal, StrategyVerdict};

use super::{prior_max, Strategy};

/// Buys a break of recent resistance only when volume confirms it.
#[derive(Debug, Clone)]
pub struct VolumeBreakoutStrategy {
    pub min_candles: usize,
    /// Close must sit above this SMA before any entry is considered
    pub trend_sma_period: usize,
    pub volume_sma_period: usize,
    /// Highs before the current bar that define resistance
    pub resistance_lookback: usize,
    /// Current volume must exceed the average by this factor
    pub volume_spike_factor: f64,
}

impl Default for VolumeBreakoutStrategy {
    fn default() -> Self {
        Self {
            min_candles: 50,
            trend_sma_period: 50,
            volume_sma_period: 20,
            resistance_lookback: 20,
            volume_spike_factor: 1.5,
        }
    }
}

impl Strategy for VolumeBreakoutStrategy {
    fn name(&self) -> &'static str {
        "O'Neil Breakout"
    }

    fn min_candles(&self) -> usize {
        self.min_candles
    }

    fn evaluate(&self, candles: &[Candle]) -> StrategyVerdict {
        if candles.len() < self.min_candles {
            return StrategyVerdict::insufficient_data(self.min_candles, candles.len());
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let current = candles[candles.len() - 1];

        let Some(trend_sma) = indicators::last(&indicators::sma(&closes, self.trend_sma_period)) else {
            return StrategyVerdict::insufficient_data(self.trend_sma_period, candles.len());
        };

        if current.close < trend_sma {
            return StrategyVerdict::new(
                Signal::Wait,
                0.5,
                format!(
                    "Price below SMA{} ({:.2}), not in an uptrend",
                    self.trend_sma_period, trend_sma
                ),
            );
        }

        let (Some(avg_volume), Some(resistance)) = (
            indicators::last(&indicators::sma(&volumes, self.volume_sma_period)),
            prior_max(&highs, self.resistance_lookback),
        ) else {
            return StrategyVerdict::insufficient_data(self.min_candles, candles.len());
        };

        let volume_ratio = if avg_volume > 0.0 { current.volume / avg_volume } else { 0.0 };
        let volume_spike = current.volume > avg_volume * self.volume_spike_factor;
        let breakout = current.close > resistance;

        match (breakout, volume_spike) {
            (true, true) => StrategyVerdict::new(
                Signal::Buy,
                0.95,
                format!(
                    "BREAKOUT: close {} cleared {}-bar high {} on {:.1}x average volume",
                    current.close, self.resistance_lookback, resistance, volume_ratio
                ),
            ),
            (true, false) => StrategyVerdict::new(
                Signal::Wait,
                0.6,
                format!(
                    "Breakout above {} but volume is weak ({:.1}x average), false breakout risk",
                    resistance, volume_ratio
                ),
            ),
            _ => StrategyVerdict::new(
                Signal::Hold,
                0.6,
                format!("In uptrend, watching resistance {}", resistance),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    fn rising(volume_last: f64) -> Vec<Candle> {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let mut candles = fixtures::from_closes(&closes);
        candles.last_mut().unwrap().volume = volume_last;
        candles
    }

    #[test]
    fn test_buy_on_breakout_with_volume_spike() {
        let verdict = VolumeBreakoutStrategy::default().evaluate(&rising(1000.0));
        assert_eq!(verdict.signal, Signal::Buy);
        assert_eq!(verdict.confidence, 0.95);
    }

    #[test]
    fn test_wait_on_breakout_without_volume() {
        let verdict = VolumeBreakoutStrategy::default().evaluate(&rising(120.0));
        assert_eq!(verdict.signal, Signal::Wait);
        assert_eq!(verdict.confidence, 0.6);
    }

    #[test]
    fn test_wait_below_trend_sma() {
        let closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        let verdict = VolumeBreakoutStrategy::default().evaluate(&fixtures::from_closes(&closes));
        assert_eq!(verdict.signal, Signal::Wait);
        assert!(verdict.reason.contains("not in an uptrend"));
    }

    #[test]
    fn test_hold_without_breakout() {
        let mut closes: Vec<f64> = (0..59).map(|i| 100.0 + i as f64).collect();
        closes.push(157.0);
        let verdict = VolumeBreakoutStrategy::default().evaluate(&fixtures::from_closes(&closes));
        assert_eq!(verdict.signal, Signal::Hold);
        assert_eq!(verdict.confidence, 0.6);
    }

    #[test]
    fn test_insufficient_data() {
        let verdict = VolumeBreakoutStrategy::default().evaluate(&rising(1000.0)[..30]);
        assert_eq!(verdict.signal, Signal::Wait);
        assert_eq!(verdict.confidence, 0.0);
    }
}
