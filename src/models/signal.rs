//! Strategy signals and verdicts.

use serde::{Deserialize, Serialize};

/// Discrete action a strategy recommends for the latest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
    Wait,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
            Signal::Wait => "WAIT",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one strategy against one candle window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyVerdict {
    pub signal: Signal,
    /// 0.0 to 1.0
    pub confidence: f64,
    pub reason: String,
}

impl StrategyVerdict {
    pub fn new(signal: Signal, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            signal,
            confidence: confidence.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }

    /// Neutral verdict returned while a strategy is still warming up.
    pub fn insufficient_data(required: usize, available: usize) -> Self {
        Self::new(
            Signal::Wait,
            0.0,
            format!("Not enough data (need {}+ candles, have {})", required, available),
        )
    }
}
