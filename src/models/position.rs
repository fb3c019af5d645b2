//! Risk state for an open position and the summary emitted when it exits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entry price and high-water mark of a held instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRiskState {
    /// Fill price recorded when the position was opened
    pub entry_price: f64,

    /// Highest price observed since entry (never decreases)
    pub high_water_mark: f64,

    /// When the position was opened
    pub entered_at: DateTime<Utc>,
}

impl PositionRiskState {
    /// Open a new position at `entry_price`.
    pub fn new(entry_price: f64) -> Self {
        Self {
            entry_price,
            high_water_mark: entry_price,
            entered_at: Utc::now(),
        }
    }

    /// Record a price observation, raising the high-water mark if needed.
    pub fn observe(&mut self, price: f64) {
        if price > self.high_water_mark {
            self.high_water_mark = price;
        }
    }

    /// Profit and loss versus entry, in percent.
    pub fn pnl_pct(&self, price: f64) -> f64 {
        if self.entry_price <= 0.0 {
            return 0.0;
        }
        (price - self.entry_price) / self.entry_price * 100.0
    }

    /// Distance below the high-water mark, in percent (zero or negative).
    pub fn drawdown_pct(&self, price: f64) -> f64 {
        if self.high_water_mark <= 0.0 {
            return 0.0;
        }
        (price - self.high_water_mark) / self.high_water_mark * 100.0
    }
}

/// Which rung of the exit ladder fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    HardStop,
    TrailStop,
    TimeDecay,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::HardStop => "HARD_STOP",
            ExitReason::TrailStop => "TRAIL_STOP",
            ExitReason::TimeDecay => "TIME_DECAY",
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emitted when an opportunistic position leaves through the exit ladder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitSummary {
    pub symbol: String,
    pub reason: ExitReason,
    pub pnl_pct: f64,
    pub drawdown_pct: f64,
    pub elapsed_ms: u64,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}
