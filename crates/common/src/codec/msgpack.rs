//! MessagePack encoding with named fields.
//!
//! Named fields keep the payload self-describing for downstream consumers
//! that decode into a plain map instead of the canonical struct.

use crate::domain::{DomainError, DomainResult, VesselReport};
use bytes::Bytes;

/// Encode a validated report. Serializing into an in-memory buffer does not
/// fail for the canonical types, so an error here indicates a bug.
pub fn encode_vessel_report(report: &VesselReport) -> DomainResult<Bytes> {
    rmp_serde::to_vec_named(report)
        .map(Bytes::from)
        .map_err(|e| DomainError::Encode(e.to_string()))
}

/// Decode a payload produced by [`encode_vessel_report`].
pub fn decode_vessel_report(payload: &[u8]) -> DomainResult<VesselReport> {
    rmp_serde::from_slice(payload).map_err(|e| DomainError::Encode(e.to_string()))
}

/// Routing suffix for a report: the MMSI as a decimal string.
pub fn subject_key(report: &VesselReport) -> String {
    report.mmsi.to_string()
}

/// Full publish subject, `{base_subject}.{mmsi}`.
pub fn vessel_subject(base_subject: &str, report: &VesselReport) -> String {
    format!("{}.{}", base_subject, subject_key(report))
}
