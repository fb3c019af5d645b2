//! Breakout strategy with an SMA trend filter and ADX strength gate.

use crate::indicators;
use crate::models::{Candle, Signal, StrategyVerdict};

use super::{prior_max, Strategy};

/// Buys new closing highs in strong trends, exits when price loses its SMA.
///
/// Exit takes precedence: a close under the SMA is a SELL no matter what
/// the breakout or ADX say.
#[derive(Debug, Clone)]
pub struct TrendBreakoutStrategy {
    pub min_candles: usize,
    /// Closes before the current bar that define the breakout level
    pub breakout_lookback: usize,
    pub sma_period: usize,
    pub adx_period: usize,
    /// Minimum ADX for a breakout to count as a real trend
    pub adx_threshold: f64,
}

impl Default for TrendBreakoutStrategy {
    fn default() -> Self {
        Self {
            min_candles: 50,
            breakout_lookback: 20,
            sma_period: 20,
            adx_period: 14,
            adx_threshold: 25.0,
        }
    }
}

impl Strategy for TrendBreakoutStrategy {
    fn name(&self) -> &'static str {
        "Livermore Breakout"
    }

    fn min_candles(&self) -> usize {
        self.min_candles
    }

    fn evaluate(&self, candles: &[Candle]) -> StrategyVerdict {
        if candles.len() < self.min_candles {
            return StrategyVerdict::insufficient_data(self.min_candles, candles.len());
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let current = closes[closes.len() - 1];

        let (Some(lookback_high), Some(sma)) = (
            prior_max(&closes, self.breakout_lookback),
            indicators::last(&indicators::sma(&closes, self.sma_period)),
        ) else {
            return StrategyVerdict::insufficient_data(self.min_candles, candles.len());
        };
        let adx = indicators::last(&indicators::adx(candles, self.adx_period)).unwrap_or(0.0);

        if current < sma {
            return StrategyVerdict::new(
                Signal::Sell,
                0.9,
                format!(
                    "EXIT: price {} fell below {}-period SMA {:.2}, trend broken",
                    current, self.sma_period, sma
                ),
            );
        }

        if current > lookback_high {
            if adx < self.adx_threshold {
                return StrategyVerdict::new(
                    Signal::Wait,
                    0.0,
                    format!(
                        "Fake-out warning: breakout above {} but ADX {:.1} < {}",
                        lookback_high, adx, self.adx_threshold
                    ),
                );
            }

            return StrategyVerdict::new(
                Signal::Buy,
                0.95,
                format!(
                    "ENTRY: new {}-bar closing high with ADX {:.1}",
                    self.breakout_lookback, adx
                ),
            );
        }

        StrategyVerdict::new(
            Signal::Hold,
            0.5,
            format!("Scanning... ADX {:.1}, resistance {}", adx, lookback_high),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    #[test]
    fn test_waits_without_enough_candles() {
        let candles = fixtures::from_closes(&[100.0; 49]);
        let verdict = TrendBreakoutStrategy::default().evaluate(&candles);
        assert_eq!(verdict.signal, Signal::Wait);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn test_sell_below_flat_sma_regardless_of_adx() {
        let mut closes = vec![100.0; 59];
        closes.push(95.0);
        let verdict = TrendBreakoutStrategy::default().evaluate(&fixtures::from_closes(&closes));
        assert_eq!(verdict.signal, Signal::Sell);
        assert_eq!(verdict.confidence, 0.9);

        // ADX requirement set out of reach still sells
        let strict = TrendBreakoutStrategy {
            adx_threshold: 1000.0,
            ..Default::default()
        };
        assert_eq!(strict.evaluate(&fixtures::from_closes(&closes)).signal, Signal::Sell);
    }

    #[test]
    fn test_buy_on_breakout_with_strong_adx() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + 2.0 * i as f64).collect();
        let verdict = TrendBreakoutStrategy::default().evaluate(&fixtures::from_closes(&closes));
        assert_eq!(verdict.signal, Signal::Buy);
        assert_eq!(verdict.confidence, 0.95);
    }

    /// Highs and lows zig-zag by the same step, so +DM and -DM alternate and
    /// cancel out. The last bar closes above every prior close.
    fn choppy_breakout() -> Vec<Candle> {
        let mut bars: Vec<_> = (0..59)
            .map(|i| {
                if i % 2 == 0 {
                    (100.0, 102.0, 98.0, 100.0, 10.0)
                } else {
                    (101.0, 103.0, 99.0, 101.0, 10.0)
                }
            })
            .collect();
        bars.push((101.0, 105.0, 101.0, 104.0, 10.0));
        fixtures::from_ohlcv(&bars)
    }

    #[test]
    fn test_wait_on_breakout_with_weak_adx() {
        let candles = choppy_breakout();
        let adx = indicators::last(&indicators::adx(&candles, 14)).unwrap();
        assert!(adx < 25.0, "adx {adx}");

        let verdict = TrendBreakoutStrategy::default().evaluate(&candles);
        assert_eq!(verdict.signal, Signal::Wait);
        assert_eq!(verdict.confidence, 0.0);
        assert!(verdict.reason.contains("Fake-out"));
    }

    #[test]
    fn test_hold_in_flat_market() {
        let verdict = TrendBreakoutStrategy::default().evaluate(&fixtures::from_closes(&[100.0; 60]));
        assert_eq!(verdict.signal, Signal::Hold);
    }
}
