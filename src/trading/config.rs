//! Trading configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Scan orchestrator cadence and per-timeframe candle windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Delay between the end of one cycle and the start of the next, in seconds
    pub scan_interval_secs: u64,

    /// Minimum elapsed time between hourly passes, in seconds
    pub hourly_interval_secs: u64,

    /// Quote currency spent on every scanner BUY
    pub buy_cost: Decimal,

    /// 1m candles pulled for the panic strategy
    pub short_candles: usize,

    /// Panic strategy is skipped unless more than this many 1m candles arrive
    pub short_min_candles: usize,

    /// 5m candles pulled for the short-timeframe ATR stop
    pub short_stop_candles: usize,

    /// 1h candles pulled for the long-timeframe ATR stop
    pub long_stop_candles: usize,

    /// 1d candles pulled for the trend strategy
    pub daily_candles: usize,

    /// Trend strategy is skipped unless more than this many 1d candles arrive
    pub daily_min_candles: usize,

    /// Log orders instead of sending them
    pub dry_run: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 60,
            hourly_interval_secs: 3600,
            buy_cost: dec!(10000),
            short_candles: 30,
            short_min_candles: 20,
            short_stop_candles: 60,
            long_stop_candles: 120,
            daily_candles: 60,
            daily_min_candles: 50,
            dry_run: false,
        }
    }
}

impl ScannerConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn hourly_interval(&self) -> Duration {
        Duration::from_secs(self.hourly_interval_secs)
    }
}

/// Relative-strength ranking of the tradable universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Instrument every return is measured against
    pub benchmark: String,

    /// Only markets with this prefix are ranked
    pub quote_prefix: String,

    /// Primary relative-strength window, in candles
    pub long_lookback: usize,

    /// Secondary relative-strength window, in candles
    pub short_lookback: usize,

    /// Survivors of the primary ranking
    pub top_n: usize,

    /// Size of the final focus list
    pub top_m: usize,

    /// Hourly candles pulled per instrument
    pub candles: usize,

    /// Concurrent candle requests while ranking
    pub concurrency: usize,

    /// Minimum time between rebuilds, in seconds
    pub refresh_interval_secs: u64,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            benchmark: "KRW-BTC".to_string(),
            quote_prefix: "KRW-".to_string(),
            long_lookback: 24,
            short_lookback: 4,
            top_n: 10,
            top_m: 5,
            candles: 60,
            concurrency: 8,
            refresh_interval_secs: 3600,
        }
    }
}

impl RankerConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Volatility stop parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    pub atr_period: usize,

    /// Stop distance in ATRs below entry
    pub atr_multiplier: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            atr_period: 14,
            atr_multiplier: 2.5,
        }
    }
}

/// Exit ladder for positions opened from trigger events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Quote currency spent on each triggered entry
    pub entry_cost: Decimal,

    /// PnL % at or below which the position is cut
    pub hard_stop_pct: f64,

    /// Drawdown from the high-water mark, %, at or below which the position is cut
    pub trail_stop_pct: f64,

    /// Seconds after entry when an undecided position is cut
    pub time_decay_secs: u64,

    /// PnL % a position needs to survive the time-decay check
    pub time_decay_min_pnl_pct: f64,

    /// Price poll interval, in milliseconds
    pub poll_interval_ms: u64,

    /// Triggers for these tickers are ignored
    pub ignored_symbols: Vec<String>,

    /// Log orders instead of sending them
    pub dry_run: bool,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            entry_cost: dec!(50000),
            hard_stop_pct: -5.0,
            trail_stop_pct: -3.0,
            time_decay_secs: 180,
            time_decay_min_pnl_pct: 1.0,
            poll_interval_ms: 1000,
            ignored_symbols: ["BTC", "ETH", "USDT", "KRW", "USDC", "BUSD"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            dry_run: false,
        }
    }
}

impl LadderConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn time_decay(&self) -> Duration {
        Duration::from_secs(self.time_decay_secs)
    }

    /// Whether a trigger for `symbol` (bare ticker or market) is ignored.
    pub fn is_ignored(&self, symbol: &str) -> bool {
        let ticker = symbol.trim().to_uppercase();
        let ticker = ticker.rsplit('-').next().unwrap_or(&ticker);
        self.ignored_symbols.iter().any(|s| s.eq_ignore_ascii_case(ticker))
    }
}

/// Everything the bot reads at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentinelConfig {
    pub scanner: ScannerConfig,
    pub ranker: RankerConfig,
    pub risk: RiskConfig,
    pub ladder: LadderConfig,
}
