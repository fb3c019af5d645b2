//! Relative Strength Index.

/// RSI from `period` consecutive changes, Wilder-smoothed.
///
/// The first value is seeded from the simple average gain/loss of the first
/// `period` changes. A zero average loss yields 100, a zero average gain
/// (with nonzero loss) yields 0. Output length is `data.len() - period`.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return Vec::new();
    }

    let p = period as f64;
    let mut gains = 0.0;
    let mut losses = 0.0;

    for i in 1..=period {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains += change;
        } else {
            losses += change.abs();
        }
    }

    let mut avg_gain = gains / p;
    let mut avg_loss = losses / p;

    let mut out = Vec::with_capacity(data.len() - period);
    out.push(relative_strength(avg_gain, avg_loss));

    for i in (period + 1)..data.len() {
        let change = data[i] - data[i - 1];
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { change.abs() } else { 0.0 };

        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;

        out.push(relative_strength(avg_gain, avg_loss));
    }

    out
}

fn relative_strength(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    if avg_gain == 0.0 {
        return 0.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
