//! True range and Average True Range.

use crate::models::Candle;

use super::wilder_average;

/// True range for every candle after the first:
/// `max(high - low, |high - prev_close|, |low - prev_close|)`.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|pair| {
            let prev_close = pair[0].close;
            let bar = &pair[1];
            (bar.high - bar.low)
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        })
        .collect()
}

/// Wilder-smoothed ATR, seeded from the mean of the first `period` true ranges.
///
/// Needs `period + 1` candles. Output length is `candles.len() - period`.
pub fn atr(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < period + 1 {
        return Vec::new();
    }
    wilder_average(&true_range(candles), period)
}
