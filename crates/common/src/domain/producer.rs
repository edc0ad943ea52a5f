use crate::domain::{DomainResult, VesselReport};
use async_trait::async_trait;

/// Trait for publishing vessel reports to the message bus
///
/// Implementations should:
/// - Encode the report to its binary wire form
/// - Publish it under `{base_subject}.{mmsi}`
/// - Return a Publish error if the bus rejects it
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait VesselReportProducer: Send + Sync {
    /// Publish a single report (buffered, no broker acknowledgement)
    ///
    /// # Arguments
    /// * `report` - VesselReport to publish
    ///
    /// # Returns
    /// () on success, DomainError on failure
    async fn publish_vessel_report(&self, report: &VesselReport) -> DomainResult<()>;

    /// Wait until every report published so far has been sent to the broker
    async fn flush(&self) -> DomainResult<()>;
}
