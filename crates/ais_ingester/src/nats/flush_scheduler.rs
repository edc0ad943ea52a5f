use anyhow::Context;
use common::nats::CorePublisher;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Periodically flushes the shared NATS connection so buffered publishes
/// reach the broker during quiet periods on the feed.
pub struct FlushScheduler {
    publisher: Arc<dyn CorePublisher>,
    interval: Duration,
}

impl FlushScheduler {
    pub fn new(publisher: Arc<dyn CorePublisher>, interval: Duration) -> Self {
        Self {
            publisher,
            interval,
        }
    }

    /// Sleep, flush, repeat until `ctx` is cancelled. No final flush is
    /// issued on cancellation; draining the connection covers that.
    #[instrument(name = "flush_scheduler", skip_all, fields(interval_ms = self.interval.as_millis() as u64))]
    pub async fn run(self, ctx: CancellationToken) -> anyhow::Result<()> {
        info!("Starting NATS flush scheduler");

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            tokio::select! {
                biased;
                _ = ctx.cancelled() => break,
                result = self.publisher.flush() => {
                    result.context("periodic NATS flush failed")?;
                    debug!("Flushed NATS connection");
                }
            }
        }

        info!("NATS flush scheduler stopped");
        Ok(())
    }
}
