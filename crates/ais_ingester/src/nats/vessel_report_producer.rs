use async_trait::async_trait;
use common::codec::{encode_vessel_report, vessel_subject};
use common::domain::{DomainError, DomainResult, VesselReport, VesselReportProducer};
use common::nats::{
    CorePublisher, LayeredPublisher, NatsPublishService, NatsPublisherBuilder, PublishRequest,
};
use std::sync::Arc;
use tower::ServiceExt;
use tracing::{info, instrument};

/// Core NATS producer for VesselReport messages
///
/// Publishes are buffered by the client; nothing here waits for the broker.
pub struct NatsVesselReportProducer {
    publisher: LayeredPublisher<NatsPublishService>,
    core: Arc<dyn CorePublisher>,
    base_subject: String,
}

impl NatsVesselReportProducer {
    pub fn new(core: Arc<dyn CorePublisher>, base_subject: String) -> Self {
        info!(
            "Created NatsVesselReportProducer with base subject: {}",
            base_subject
        );
        let publisher = NatsPublisherBuilder::new(core.clone())
            .with_logging()
            .build();

        Self {
            publisher,
            core,
            base_subject,
        }
    }
}

#[async_trait]
impl VesselReportProducer for NatsVesselReportProducer {
    #[instrument(level = "debug", skip_all, fields(mmsi = report.mmsi, msg_uuid = %report.msg_uuid))]
    async fn publish_vessel_report(&self, report: &VesselReport) -> DomainResult<()> {
        let payload = encode_vessel_report(report)?;

        // Build subject: {base_subject}.{mmsi}
        let subject = vessel_subject(&self.base_subject, report);

        self.publisher
            .clone()
            .oneshot(PublishRequest::new(subject.clone(), payload))
            .await
            .map_err(|e| DomainError::publish(subject, e))?;

        Ok(())
    }

    async fn flush(&self) -> DomainResult<()> {
        self.core
            .flush()
            .await
            .map_err(|e| DomainError::publish(self.base_subject.as_str(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::{TimeZone, Utc};
    use common::codec::decode_vessel_report;
    use common::nats::MockCorePublisher;
    use std::sync::Mutex;

    fn report(mmsi: u32) -> VesselReport {
        VesselReport {
            msg_uuid: uuid::Uuid::new_v4(),
            mmsi,
            msg_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            lat: Some(69.6489),
            lon: Some(18.9551),
            speed: Some(11.2),
            course: Some(183.4),
            heading: Some(182),
            rot: None,
            status: Some(0),
            shipname: Some("NORDLYS".to_string()),
            shiptype: Some(60),
            callsign: None,
            imo: None,
            a: None,
            b: None,
            c: None,
            d: None,
        }
    }

    #[tokio::test]
    async fn test_publish_routes_by_mmsi_and_encodes_report() {
        // Arrange
        let captured: Arc<Mutex<Vec<(String, Bytes)>>> = Arc::default();
        let sink = captured.clone();
        let mut mock_core = MockCorePublisher::new();
        mock_core
            .expect_publish()
            .times(1)
            .returning(move |subject, payload| {
                sink.lock().unwrap().push((subject, payload));
                Ok(())
            });

        let producer = NatsVesselReportProducer::new(Arc::new(mock_core), "raw_ais".to_string());
        let report = report(257654600);

        // Act
        let result = producer.publish_vessel_report(&report).await;

        // Assert
        assert!(result.is_ok());
        let captured = captured.lock().unwrap();
        assert_eq!(captured[0].0, "raw_ais.257654600");
        assert_eq!(decode_vessel_report(&captured[0].1).unwrap(), report);
    }

    #[tokio::test]
    async fn test_publish_failure_maps_to_publish_error() {
        let mut mock_core = MockCorePublisher::new();
        mock_core
            .expect_publish()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("connection closed")));

        let producer = NatsVesselReportProducer::new(Arc::new(mock_core), "raw_ais".to_string());

        let result = producer.publish_vessel_report(&report(42)).await;

        match result {
            Err(DomainError::Publish { subject, message }) => {
                assert_eq!(subject, "raw_ais.42");
                assert!(message.contains("connection closed"));
            }
            other => panic!("expected publish error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_flush_delegates_to_core_publisher() {
        let mut mock_core = MockCorePublisher::new();
        mock_core.expect_publish().times(0);
        mock_core.expect_flush().times(1).returning(|| Ok(()));

        let producer = NatsVesselReportProducer::new(Arc::new(mock_core), "raw_ais".to_string());

        assert!(producer.flush().await.is_ok());
    }
}
