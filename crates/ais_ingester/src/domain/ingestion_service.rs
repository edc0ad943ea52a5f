use common::domain::{
    parse_line, parse_record, DomainResult, RecordError, VesselReport, VesselReportProducer,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// What happened to a single upstream record
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Published { mmsi: u32 },
    Skipped(RecordError),
}

/// Per-session counters, logged when a backfill or live session ends
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    pub received: u64,
    pub published: u64,
    pub skipped: u64,
}

impl IngestionStats {
    pub fn record(&mut self, outcome: &IngestOutcome) {
        self.received += 1;
        match outcome {
            IngestOutcome::Published { .. } => self.published += 1,
            IngestOutcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Domain service that takes one raw record through
/// normalize → validate → encode → publish.
///
/// Records that fail decoding or validation are skipped and reported as
/// [`IngestOutcome::Skipped`]; only publish failures are returned as errors.
pub struct IngestionService {
    producer: Arc<dyn VesselReportProducer>,
}

impl IngestionService {
    pub fn new(producer: Arc<dyn VesselReportProducer>) -> Self {
        Self { producer }
    }

    /// Ingest one element of a backfill batch
    pub async fn ingest_record(&self, value: Value) -> DomainResult<IngestOutcome> {
        self.publish_parsed(parse_record(value)).await
    }

    /// Ingest one line of the live stream
    pub async fn ingest_line(&self, line: &str) -> DomainResult<IngestOutcome> {
        self.publish_parsed(parse_line(line)).await
    }

    /// Flush everything published so far
    pub async fn flush(&self) -> DomainResult<()> {
        self.producer.flush().await
    }

    async fn publish_parsed(
        &self,
        parsed: Result<VesselReport, RecordError>,
    ) -> DomainResult<IngestOutcome> {
        let report = match parsed {
            Ok(report) => report,
            Err(e) => {
                debug!(error = %e, "skipping invalid AIS record");
                return Ok(IngestOutcome::Skipped(e));
            }
        };

        self.producer.publish_vessel_report(&report).await?;

        Ok(IngestOutcome::Published { mmsi: report.mmsi })
    }
}
