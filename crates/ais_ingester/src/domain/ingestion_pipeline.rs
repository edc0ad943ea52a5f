use crate::domain::{AisFeed, IngestionService, IngestionStats};
use chrono::NaiveDate;
use common::domain::DomainResult;
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

/// Drives one ingestion session: an optional backfill batch followed by the
/// live stream, both feeding the same [`IngestionService`].
///
/// Every backfill record is handed to the publisher before the live stream
/// is opened, so per-vessel order on the bus matches upstream order.
pub struct IngestionPipeline {
    feed: Arc<dyn AisFeed>,
    service: IngestionService,
    backfill_since: Option<NaiveDate>,
}

impl IngestionPipeline {
    pub fn new(
        feed: Arc<dyn AisFeed>,
        service: IngestionService,
        backfill_since: Option<NaiveDate>,
    ) -> Self {
        Self {
            feed,
            service,
            backfill_since,
        }
    }

    /// Run until the live stream ends, fails, or `ctx` is cancelled.
    ///
    /// A clean end of stream and cancellation both return `Ok`; a transport
    /// failure on the live stream or any publish failure returns `Err`.
    #[instrument(name = "ais_ingestion", skip_all)]
    pub async fn run(self, ctx: CancellationToken) -> anyhow::Result<()> {
        if let Some(since) = self.backfill_since {
            self.run_backfill(since, &ctx).await?;

            if ctx.is_cancelled() {
                info!("AIS ingestion cancelled during backfill");
                return Ok(());
            }
            info!("Starting streaming mode");
        }

        self.run_live(&ctx).await
    }

    async fn run_backfill(&self, since: NaiveDate, ctx: &CancellationToken) -> DomainResult<()> {
        info!(since = %since, "Fetching historical AIS data");

        let records = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Ok(()),
            result = self.feed.fetch_backfill(since) => result,
        };

        let records = match records {
            Ok(records) => records,
            Err(e) => {
                // live data is still useful without history
                error!(error = %e, "Failed to fetch historical AIS data, continuing with live stream");
                return Ok(());
            }
        };

        info!(count = records.len(), "Received historical AIS data");

        let mut stats = IngestionStats::default();
        for record in records {
            if ctx.is_cancelled() {
                break;
            }
            let outcome = self.service.ingest_record(record).await?;
            stats.record(&outcome);
        }

        self.service.flush().await?;

        info!(
            received = stats.received,
            published = stats.published,
            skipped = stats.skipped,
            "Finished publishing historical AIS data"
        );

        Ok(())
    }

    async fn run_live(&self, ctx: &CancellationToken) -> anyhow::Result<()> {
        let mut lines = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Ok(()),
            stream = self.feed.open_stream() => stream?,
        };

        let mut stats = IngestionStats::default();
        let result: DomainResult<()> = loop {
            let next = tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    info!("AIS ingestion cancelled");
                    break Ok(());
                }
                next = lines.next() => next,
            };

            match next {
                Some(Ok(line)) => match self.service.ingest_line(&line).await {
                    Ok(outcome) => stats.record(&outcome),
                    Err(e) => break Err(e),
                },
                Some(Err(e)) => {
                    error!(error = %e, "AIS stream failed");
                    break Err(e);
                }
                None => {
                    info!("AIS stream ended");
                    break Ok(());
                }
            }
        };

        info!(
            received = stats.received,
            published = stats.published,
            skipped = stats.skipped,
            "Live AIS session finished"
        );

        result.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LineStream, MockAisFeed};
    use async_trait::async_trait;
    use common::domain::{DomainError, VesselReport, VesselReportProducer};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Records what reaches the publisher, in order
    #[derive(Default)]
    struct RecordingProducer {
        events: Mutex<Vec<String>>,
        fail_on_mmsi: Option<u32>,
    }

    impl RecordingProducer {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VesselReportProducer for RecordingProducer {
        async fn publish_vessel_report(&self, report: &VesselReport) -> DomainResult<()> {
            if self.fail_on_mmsi == Some(report.mmsi) {
                return Err(DomainError::publish("raw_ais", "connection closed"));
            }
            self.events
                .lock()
                .unwrap()
                .push(format!("publish {}", report.mmsi));
            Ok(())
        }

        async fn flush(&self) -> DomainResult<()> {
            self.events.lock().unwrap().push("flush".to_string());
            Ok(())
        }
    }

    fn api_record(mmsi: u32) -> Value {
        json!({
            "mmsi": mmsi,
            "msgtime": "2024-05-01T12:00:00+00:00",
            "latitude": 69.6,
            "longitude": 18.9
        })
    }

    fn line_stream(lines: Vec<DomainResult<String>>) -> LineStream {
        futures::stream::iter(lines).boxed()
    }

    fn pipeline(
        feed: MockAisFeed,
        producer: Arc<RecordingProducer>,
        since: Option<NaiveDate>,
    ) -> IngestionPipeline {
        IngestionPipeline::new(Arc::new(feed), IngestionService::new(producer), since)
    }

    fn since() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 5, 1)
    }

    #[tokio::test]
    async fn test_backfill_is_published_before_live_records() {
        // Arrange
        let mut feed = MockAisFeed::new();
        feed.expect_fetch_backfill()
            .times(1)
            .returning(|_| Ok(vec![api_record(1), api_record(2), api_record(3)]));
        feed.expect_open_stream().times(1).returning(|| {
            Ok(line_stream(vec![
                Ok(api_record(4).to_string()),
                Ok(api_record(5).to_string()),
            ]))
        });
        let producer = Arc::new(RecordingProducer::default());

        // Act
        let result = pipeline(feed, producer.clone(), since())
            .run(CancellationToken::new())
            .await;

        // Assert
        assert!(result.is_ok());
        assert_eq!(
            producer.events(),
            vec![
                "publish 1",
                "publish 2",
                "publish 3",
                "flush",
                "publish 4",
                "publish 5"
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_records_do_not_stop_the_stream() {
        let mut feed = MockAisFeed::new();
        feed.expect_fetch_backfill().times(0);
        feed.expect_open_stream().times(1).returning(|| {
            Ok(line_stream(vec![
                Ok(api_record(1).to_string()),
                Ok("not json".to_string()),
                Ok(json!({"mmsi": 2}).to_string()),
                Ok(api_record(3).to_string()),
            ]))
        });
        let producer = Arc::new(RecordingProducer::default());

        let result = pipeline(feed, producer.clone(), None)
            .run(CancellationToken::new())
            .await;

        assert!(result.is_ok());
        assert_eq!(producer.events(), vec!["publish 1", "publish 3"]);
    }

    #[tokio::test]
    async fn test_backfill_transport_error_still_starts_live_stream() {
        let mut feed = MockAisFeed::new();
        feed.expect_fetch_backfill()
            .times(1)
            .returning(|_| Err(DomainError::transport("http://ais", "status 503")));
        feed.expect_open_stream()
            .times(1)
            .returning(|| Ok(line_stream(vec![Ok(api_record(7).to_string())])));
        let producer = Arc::new(RecordingProducer::default());

        let result = pipeline(feed, producer.clone(), since())
            .run(CancellationToken::new())
            .await;

        assert!(result.is_ok());
        assert_eq!(producer.events(), vec!["publish 7"]);
    }

    #[tokio::test]
    async fn test_backfill_publish_error_is_fatal() {
        let mut feed = MockAisFeed::new();
        feed.expect_fetch_backfill()
            .times(1)
            .returning(|_| Ok(vec![api_record(1), api_record(2)]));
        feed.expect_open_stream().times(0);
        let producer = Arc::new(RecordingProducer {
            fail_on_mmsi: Some(2),
            ..Default::default()
        });

        let result = pipeline(feed, producer.clone(), since())
            .run(CancellationToken::new())
            .await;

        assert!(result.is_err());
        assert_eq!(producer.events(), vec!["publish 1"]);
    }

    #[tokio::test]
    async fn test_stream_transport_error_is_fatal() {
        let mut feed = MockAisFeed::new();
        feed.expect_open_stream().times(1).returning(|| {
            Ok(line_stream(vec![
                Ok(api_record(1).to_string()),
                Err(DomainError::transport("http://ais", "connection reset")),
                Ok(api_record(2).to_string()),
            ]))
        });
        let producer = Arc::new(RecordingProducer::default());

        let result = pipeline(feed, producer.clone(), None)
            .run(CancellationToken::new())
            .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(producer.events(), vec!["publish 1"]);
    }

    #[tokio::test]
    async fn test_stream_open_failure_is_fatal() {
        let mut feed = MockAisFeed::new();
        feed.expect_open_stream()
            .times(1)
            .returning(|| Err(DomainError::transport("http://ais", "status 401")));
        let producer = Arc::new(RecordingProducer::default());

        let result = pipeline(feed, producer.clone(), None)
            .run(CancellationToken::new())
            .await;

        assert!(result.is_err());
        assert!(producer.events().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_stops_an_idle_stream() {
        // Arrange
        let mut feed = MockAisFeed::new();
        feed.expect_open_stream()
            .times(0..=1)
            .returning(|| Ok(futures::stream::pending().boxed()));
        let producer = Arc::new(RecordingProducer::default());
        let ctx = CancellationToken::new();

        // Act
        let handle = tokio::spawn(pipeline(feed, producer.clone(), None).run(ctx.clone()));
        ctx.cancel();
        let result = handle.await.unwrap();

        // Assert
        assert!(result.is_ok());
        assert!(producer.events().is_empty());
    }
}
