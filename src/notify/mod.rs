//! Outbound decision events: the sink interface and a fan-out notifier.

mod dashboard;

pub use dashboard::DashboardNotifier;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::models::{DecisionEvent, ExitSummary};

/// Receiver of trading decisions.
#[async_trait]
pub trait DecisionSink: Send + Sync {
    /// Name used when a delivery fails.
    fn name(&self) -> &'static str;

    /// A strategy or trigger flagged `symbol`; sent before any order.
    async fn on_signal(&self, _symbol: &str, _text: &str) -> Result<()> {
        Ok(())
    }

    /// An order was accepted (or simulated in dry-run mode).
    async fn on_decision(&self, event: &DecisionEvent) -> Result<()>;

    /// An exit-ladder position closed.
    async fn on_exit(&self, summary: &ExitSummary) -> Result<()>;
}

/// Delivers every event to each registered sink. A failing sink is logged
/// and does not stop delivery to the others.
#[derive(Default, Clone)]
pub struct Notifier {
    sinks: Vec<Arc<dyn DecisionSink>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn DecisionSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

#[async_trait]
impl DecisionSink for Notifier {
    fn name(&self) -> &'static str {
        "notifier"
    }

    async fn on_signal(&self, symbol: &str, text: &str) -> Result<()> {
        for sink in &self.sinks {
            if let Err(e) = sink.on_signal(symbol, text).await {
                warn!(sink = sink.name(), symbol = %symbol, error = %e, "Failed to deliver signal");
            }
        }
        Ok(())
    }

    async fn on_decision(&self, event: &DecisionEvent) -> Result<()> {
        for sink in &self.sinks {
            if let Err(e) = sink.on_decision(event).await {
                warn!(sink = sink.name(), symbol = %event.symbol, error = %e, "Failed to deliver decision");
            }
        }
        Ok(())
    }

    async fn on_exit(&self, summary: &ExitSummary) -> Result<()> {
        for sink in &self.sinks {
            if let Err(e) = sink.on_exit(summary).await {
                warn!(sink = sink.name(), symbol = %summary.symbol, error = %e, "Failed to deliver exit");
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::recording::RecordingSink;
    use super::*;
    use crate::models::ExitReason;
    use chrono::Utc;

    struct FailingSink;

    #[async_trait]
    impl DecisionSink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn on_decision(&self, _event: &DecisionEvent) -> Result<()> {
            anyhow::bail!("down")
        }

        async fn on_exit(&self, _summary: &ExitSummary) -> Result<()> {
            anyhow::bail!("down")
        }
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_block_others() {
        let recorder = Arc::new(RecordingSink::default());
        let notifier = Notifier::new()
            .with_sink(Arc::new(FailingSink))
            .with_sink(recorder.clone());

        let summary = ExitSummary {
            symbol: "KRW-ABC".to_string(),
            reason: ExitReason::HardStop,
            pnl_pct: -5.2,
            drawdown_pct: -5.2,
            elapsed_ms: 12_000,
            timestamp: Utc::now(),
        };
        notifier.on_exit(&summary).await.unwrap();
        notifier.on_signal("KRW-ABC", "listing").await.unwrap();

        assert_eq!(notifier.len(), 2);
        assert_eq!(recorder.exits().len(), 1);
        assert_eq!(recorder.signals(), vec![("KRW-ABC".to_string(), "listing".to_string())]);
    }
}
