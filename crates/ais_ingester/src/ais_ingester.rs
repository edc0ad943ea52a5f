use crate::domain::{AisFeed, IngestionPipeline, IngestionService};
use crate::nats::{FlushScheduler, NatsVesselReportProducer};
use chrono::NaiveDate;
use common::nats::CorePublisher;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A long-running process handed to the runner
pub type RunnerProcess = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        + Send,
>;

pub struct AisIngesterConfig {
    pub base_subject: String,
    pub flush_interval: Duration,
    pub backfill_since: Option<NaiveDate>,
}

/// Wires the feed, the NATS producer and the flush scheduler around one
/// shared NATS connection.
pub struct AisIngester {
    pipeline: IngestionPipeline,
    flush_scheduler: FlushScheduler,
}

impl AisIngester {
    pub fn new(
        feed: Arc<dyn AisFeed>,
        publisher: Arc<dyn CorePublisher>,
        config: AisIngesterConfig,
    ) -> Self {
        info!("Initializing AIS ingester");

        let producer = Arc::new(NatsVesselReportProducer::new(
            publisher.clone(),
            config.base_subject,
        ));
        let pipeline = IngestionPipeline::new(
            feed,
            IngestionService::new(producer),
            config.backfill_since,
        );
        let flush_scheduler = FlushScheduler::new(publisher, config.flush_interval);

        Self {
            pipeline,
            flush_scheduler,
        }
    }

    pub fn into_runner_processes(self) -> Vec<(&'static str, RunnerProcess)> {
        let pipeline = self.pipeline;
        let ingestion: RunnerProcess =
            Box::new(move |ctx| Box::pin(async move { pipeline.run(ctx).await }));

        let scheduler = self.flush_scheduler;
        let flush: RunnerProcess =
            Box::new(move |ctx| Box::pin(async move { scheduler.run(ctx).await }));

        vec![("ais_ingestion", ingestion), ("flush_scheduler", flush)]
    }
}
