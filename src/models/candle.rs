//! OHLCV candle model and the timeframes the scanner pulls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV bar for a fixed timeframe.
///
/// Candle sequences handed to indicators and strategies are ordered by
/// strictly increasing `timestamp` (oldest first).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Base-currency volume traded during the bar
    pub volume: f64,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Close above open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// Candle timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneMinute => "1m",
            Timeframe::FiveMinutes => "5m",
            Timeframe::OneHour => "1h",
            Timeframe::OneDay => "1d",
        }
    }

    /// Minute unit for intraday timeframes, `None` for daily bars.
    pub fn minutes(&self) -> Option<u32> {
        match self {
            Timeframe::OneMinute => Some(1),
            Timeframe::FiveMinutes => Some(5),
            Timeframe::OneHour => Some(60),
            Timeframe::OneDay => None,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{Duration, TimeZone};

    /// Candles with the given closes, one minute apart. Open equals the
    /// previous close, high/low bracket the bar by 0.5.
    pub fn from_closes(closes: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                Candle::new(
                    start + Duration::minutes(i as i64),
                    open,
                    open.max(close) + 0.5,
                    open.min(close) - 0.5,
                    close,
                    100.0,
                )
            })
            .collect()
    }

    /// Candles from explicit (open, high, low, close, volume) tuples.
    pub fn from_ohlcv(bars: &[(f64, f64, f64, f64, f64)]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        bars.iter()
            .enumerate()
            .map(|(i, &(o, h, l, c, v))| {
                Candle::new(start + Duration::minutes(i as i64), o, h, l, c, v)
            })
            .collect()
    }
}
