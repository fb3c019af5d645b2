//! Technical indicator engine.
//!
//! Every function here is pure: it maps a sample series (or a candle
//! sequence) to a derived series aligned with the tail of the input. When
//! the input is shorter than the indicator's warm-up the result is empty,
//! never an error. Strategies and risk rules read only the last value.

mod momentum;
mod moving_average;
mod trend;
mod volatility;

pub use momentum::rsi;
pub use moving_average::{ema, sma};
pub use trend::adx;
pub use volatility::{atr, true_range};

/// Wilder's smoothed average: seeded with the simple mean of the first
/// `period` values, then `avg = (avg * (period - 1) + value) / period`.
pub(crate) fn wilder_average(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let p = period as f64;
    let mut avg = values[..period].iter().sum::<f64>() / p;
    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(avg);

    for &value in &values[period..] {
        avg = (avg * (p - 1.0) + value) / p;
        out.push(avg);
    }

    out
}

/// Last value of a series, if any.
pub fn last(series: &[f64]) -> Option<f64> {
    series.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wilder_average_seed_and_recurrence() {
        let out = wilder_average(&[2.0, 4.0, 6.0, 8.0], 2);
        // seed (2+4)/2 = 3, then (3*1+6)/2 = 4.5, then (4.5+8)/2 = 6.25
        assert_eq!(out, vec![3.0, 4.5, 6.25]);
    }

    #[test]
    fn test_wilder_average_short_input() {
        assert!(wilder_average(&[1.0], 2).is_empty());
        assert!(wilder_average(&[1.0, 2.0], 0).is_empty());
    }
}
