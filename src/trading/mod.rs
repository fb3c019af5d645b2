//! Trading logic: risk rules, shared state, ranking, execution, exit ladder.

mod config;
mod executor;
mod monitor;
mod ranker;
mod risk;
mod state;

pub use config::{RiskConfig, ScannerConfig, SentinelConfig};
pub use executor::{OrderExecutor, OrderIntent};
pub use monitor::TriggerHandler;
pub use ranker::WatchlistRanker;
pub use risk::AtrStop;
pub use state::{default_watchlist, ActivePositions, EntryPriceBook, FocusList};
