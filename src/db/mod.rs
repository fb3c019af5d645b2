//! SQLite decision journal.
//!
//! Append-only record of:
//! - Orders placed by the scanner and the exit ladder (real or dry-run)
//! - Exit-ladder closes with their PnL, drawdown and holding time

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::models::{DecisionEvent, ExitSummary};
use crate::notify::DecisionSink;

/// Database connection pool for the journal.
pub struct Database {
    pool: SqlitePool,
}

/// Stored decision record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredDecision {
    pub id: i64,
    pub symbol: String,
    pub action: String,
    pub reason: String,
    pub strategy: String,
    pub amount: String,
    pub price: Option<f64>,
    pub order_id: Option<String>,
    pub dry_run: bool,
    pub created_at: String,
}

/// Stored exit-ladder close.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredExit {
    pub id: i64,
    pub symbol: String,
    pub reason: String,
    pub pnl_pct: f64,
    pub drawdown_pct: f64,
    pub elapsed_ms: i64,
    pub created_at: String,
}

impl Database {
    /// Create a new database connection.
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::connect(database_url, 5).await
    }

    /// Private in-memory journal. A single connection keeps every query on
    /// the same database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run all database migrations.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS decisions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                action TEXT NOT NULL,
                reason TEXT NOT NULL,
                strategy TEXT NOT NULL,
                amount TEXT NOT NULL,
                price REAL,
                order_id TEXT,
                dry_run INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create decisions table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS exits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                reason TEXT NOT NULL,
                pnl_pct REAL NOT NULL,
                drawdown_pct REAL NOT NULL,
                elapsed_ms INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create exits table")?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_decisions_symbol ON decisions(symbol)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Append one placed order.
    pub async fn record_decision(&self, event: &DecisionEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO decisions (
                symbol, action, reason, strategy, amount, price, order_id, dry_run, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.symbol)
        .bind(event.action.as_str())
        .bind(&event.reason)
        .bind(&event.strategy_name)
        .bind(event.amount.to_string())
        .bind(event.price)
        .bind(event.order_id.as_deref())
        .bind(event.dry_run)
        .bind(event.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to record decision")?;

        Ok(())
    }

    /// Append one exit-ladder close.
    pub async fn record_exit(&self, summary: &ExitSummary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO exits (symbol, reason, pnl_pct, drawdown_pct, elapsed_ms, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&summary.symbol)
        .bind(summary.reason.as_str())
        .bind(summary.pnl_pct)
        .bind(summary.drawdown_pct)
        .bind(i64::try_from(summary.elapsed_ms).unwrap_or(i64::MAX))
        .bind(summary.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to record exit")?;

        Ok(())
    }

    /// Most recent decisions, newest first.
    pub async fn recent_decisions(&self, limit: i64) -> Result<Vec<StoredDecision>> {
        sqlx::query_as::<_, StoredDecision>("SELECT * FROM decisions ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch decisions")
    }

    /// Most recent exit-ladder closes, newest first.
    pub async fn recent_exits(&self, limit: i64) -> Result<Vec<StoredExit>> {
        sqlx::query_as::<_, StoredExit>("SELECT * FROM exits ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch exits")
    }

    /// Count of decisions per action (buys, sells).
    pub async fn decision_counts(&self) -> Result<(i64, i64)> {
        let (buys,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM decisions WHERE action = 'BUY'")
            .fetch_one(&self.pool)
            .await?;

        let (sells,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM decisions WHERE action = 'SELL'")
            .fetch_one(&self.pool)
            .await?;

        Ok((buys, sells))
    }
}

#[async_trait]
impl DecisionSink for Database {
    fn name(&self) -> &'static str {
        "journal"
    }

    async fn on_decision(&self, event: &DecisionEvent) -> Result<()> {
        self.record_decision(event).await
    }

    async fn on_exit(&self, summary: &ExitSummary) -> Result<()> {
        self.record_exit(summary).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExitReason, TradeSide};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn decision(symbol: &str, action: TradeSide) -> DecisionEvent {
        DecisionEvent {
            symbol: symbol.to_string(),
            action,
            reason: "RSI 18.2, volume 12.0x".to_string(),
            strategy_name: "GCR Reversion".to_string(),
            amount: dec!(10000),
            price: Some(2150.5),
            order_id: Some("abc".to_string()),
            dry_run: true,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_decisions_round_trip_newest_first() {
        let db = Database::in_memory().await.unwrap();
        db.on_decision(&decision("KRW-SOL", TradeSide::Buy)).await.unwrap();
        db.on_decision(&decision("KRW-SOL", TradeSide::Sell)).await.unwrap();
        db.on_decision(&decision("KRW-XRP", TradeSide::Buy)).await.unwrap();

        let recent = db.recent_decisions(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].symbol, "KRW-XRP");
        assert_eq!(recent[1].action, "SELL");
        assert_eq!(recent[0].amount, "10000");
        assert!(recent[0].dry_run);

        assert_eq!(db.decision_counts().await.unwrap(), (2, 1));
    }

    #[tokio::test]
    async fn test_exits_are_journaled() {
        let db = Database::in_memory().await.unwrap();
        let summary = ExitSummary {
            symbol: "KRW-PNUT".to_string(),
            reason: ExitReason::TimeDecay,
            pnl_pct: 0.4,
            drawdown_pct: -1.1,
            elapsed_ms: 180_500,
            timestamp: Utc::now(),
        };
        tokio_test::assert_ok!(db.on_exit(&summary).await);

        let exits = db.recent_exits(10).await.unwrap();
        assert_eq!(exits.len(), 1);
        assert_eq!(exits[0].reason, "TIME_DECAY");
        assert_eq!(exits[0].elapsed_ms, 180_500);
    }
}
