//! Shared mutable state: entry prices, active ladder positions, focus list.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::PositionRiskState;

/// Entry price and high-water mark per symbol for scanner-opened positions.
#[derive(Debug, Default)]
pub struct EntryPriceBook {
    entries: RwLock<HashMap<String, PositionRiskState>>,
}

impl EntryPriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `symbol` at `entry_price`, replacing any prior entry.
    pub async fn record(&self, symbol: &str, entry_price: f64) {
        self.entries
            .write()
            .await
            .insert(symbol.to_string(), PositionRiskState::new(entry_price));
    }

    pub async fn get(&self, symbol: &str) -> Option<PositionRiskState> {
        self.entries.read().await.get(symbol).copied()
    }

    /// Raise the high-water mark of a tracked symbol.
    pub async fn observe(&self, symbol: &str, price: f64) {
        if let Some(state) = self.entries.write().await.get_mut(symbol) {
            state.observe(price);
        }
    }

    pub async fn clear(&self, symbol: &str) -> Option<PositionRiskState> {
        self.entries.write().await.remove(symbol)
    }

    /// Number of tracked positions.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Symbols with a live exit-ladder monitor.
#[derive(Debug, Default)]
pub struct ActivePositions {
    symbols: Mutex<HashSet<String>>,
}

impl ActivePositions {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claim `symbol`. Returns `None` if it is already active; the returned
    /// guard releases the claim when dropped.
    pub fn try_register(self: &Arc<Self>, symbol: &str) -> Option<ActiveGuard> {
        let mut symbols = self.symbols.lock().unwrap_or_else(|e| e.into_inner());
        if !symbols.insert(symbol.to_string()) {
            return None;
        }
        Some(ActiveGuard {
            registry: Arc::clone(self),
            symbol: symbol.to_string(),
        })
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registration of one symbol in [`ActivePositions`].
#[derive(Debug)]
pub struct ActiveGuard {
    registry: Arc<ActivePositions>,
    symbol: String,
}

impl ActiveGuard {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.registry
            .symbols
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.symbol);
        debug!(symbol = %self.symbol, "Released active position");
    }
}

/// Instruments the scanner walks, replaced wholesale by the ranker.
#[derive(Debug)]
pub struct FocusList {
    symbols: RwLock<Arc<Vec<String>>>,
}

impl FocusList {
    pub fn new(initial: Vec<String>) -> Self {
        Self {
            symbols: RwLock::new(Arc::new(initial)),
        }
    }

    /// Consistent view for one cycle; later replacements do not affect it.
    pub async fn snapshot(&self) -> Arc<Vec<String>> {
        Arc::clone(&*self.symbols.read().await)
    }

    pub async fn replace(&self, symbols: Vec<String>) {
        *self.symbols.write().await = Arc::new(symbols);
    }
}

/// Watchlist used until the first ranking completes.
pub fn default_watchlist() -> Vec<String> {
    [
        "KRW-BTC", "KRW-ETH", "KRW-XRP", "KRW-SOL", "KRW-DOGE", "KRW-SUI", "KRW-SEI", "KRW-NEAR",
        "KRW-AVAX", "KRW-ETC",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entry_book_lifecycle() {
        let book = EntryPriceBook::new();
        book.record("KRW-SOL", 100.0).await;
        book.observe("KRW-SOL", 120.0).await;
        book.observe("KRW-SOL", 110.0).await;

        let state = book.get("KRW-SOL").await.unwrap();
        assert_eq!(state.entry_price, 100.0);
        assert_eq!(state.high_water_mark, 120.0);

        assert_eq!(book.len().await, 1);
        assert!(book.clear("KRW-SOL").await.is_some());
        assert!(book.get("KRW-SOL").await.is_none());
        assert_eq!(book.len().await, 0);
    }

    #[test]
    fn test_active_positions_are_exclusive() {
        let active = ActivePositions::new();

        let guard = active.try_register("KRW-PNUT").unwrap();
        assert!(active.try_register("KRW-PNUT").is_none());
        assert!(active.contains("KRW-PNUT"));

        drop(guard);
        assert!(!active.contains("KRW-PNUT"));
        assert!(active.try_register("KRW-PNUT").is_some());
    }

    #[tokio::test]
    async fn test_guard_released_when_task_panics() {
        let active = ActivePositions::new();
        let guard = active.try_register("KRW-ABC").unwrap();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("monitor failed");
        });
        assert!(handle.await.is_err());
        assert_eq!(active.len(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_is_stable_across_replace() {
        let focus = FocusList::new(vec!["KRW-A".to_string()]);
        let snapshot = focus.snapshot().await;

        focus.replace(vec!["KRW-B".to_string(), "KRW-C".to_string()]).await;

        assert_eq!(snapshot.as_slice(), ["KRW-A".to_string()]);
        assert_eq!(focus.snapshot().await.len(), 2);
    }
}
