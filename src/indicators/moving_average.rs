//! Simple and exponential moving averages.

/// Arithmetic mean over each trailing window of `period` samples.
///
/// Output length is `data.len() - period + 1`.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }

    data.windows(period)
        .map(|window| window.iter().sum::<f64>() / period as f64)
        .collect()
}

/// Exponential moving average seeded with the SMA of the first `period`
/// samples, then `v[i] = x[i] * k + v[i-1] * (1 - k)` with `k = 2 / (period + 1)`.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut prev = data[..period].iter().sum::<f64>() / period as f64;
    let mut out = Vec::with_capacity(data.len() - period + 1);
    out.push(prev);

    for &x in &data[period..] {
        prev = x * k + prev * (1.0 - k);
        out.push(prev);
    }

    out
}
