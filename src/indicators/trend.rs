//! Average Directional Index.

use crate::models::Candle;

use super::{true_range, wilder_average};

/// ADX over `period` using Wilder's running-sum smoothing for TR, +DM and
/// -DM, then Wilder's average of DX.
///
/// Needs at least `2 * period` candles. A directional move counts only when
/// it is positive and larger than the opposite move. DX is 0 whenever
/// `+DI + -DI` (or the smoothed TR) is 0.
pub fn adx(candles: &[Candle], period: usize) -> Vec<f64> {
    if period == 0 || candles.len() < period * 2 {
        return Vec::new();
    }

    let trs = true_range(candles);
    let (dm_plus, dm_minus): (Vec<f64>, Vec<f64>) = candles
        .windows(2)
        .map(|pair| {
            let up_move = pair[1].high - pair[0].high;
            let down_move = pair[0].low - pair[1].low;
            let plus = if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 };
            let minus = if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 };
            (plus, minus)
        })
        .unzip();

    let p = period as f64;
    let mut smooth_tr: f64 = trs[..period].iter().sum();
    let mut smooth_plus: f64 = dm_plus[..period].iter().sum();
    let mut smooth_minus: f64 = dm_minus[..period].iter().sum();

    let mut dxs = Vec::with_capacity(trs.len() - period + 1);
    dxs.push(directional_index(smooth_tr, smooth_plus, smooth_minus));

    for i in period..trs.len() {
        smooth_tr = smooth_tr - smooth_tr / p + trs[i];
        smooth_plus = smooth_plus - smooth_plus / p + dm_plus[i];
        smooth_minus = smooth_minus - smooth_minus / p + dm_minus[i];
        dxs.push(directional_index(smooth_tr, smooth_plus, smooth_minus));
    }

    wilder_average(&dxs, period)
}

fn directional_index(smooth_tr: f64, smooth_plus: f64, smooth_minus: f64) -> f64 {
    if smooth_tr == 0.0 {
        return 0.0;
    }
    let di_plus = smooth_plus / smooth_tr * 100.0;
    let di_minus = smooth_minus / smooth_tr * 100.0;
    let sum = di_plus + di_minus;
    if sum == 0.0 {
        0.0
    } else {
        (di_plus - di_minus).abs() / sum * 100.0
    }
}
