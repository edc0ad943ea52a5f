use bytes::Bytes;

/// One encoded vessel report bound for `subject`
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub subject: String,
    pub payload: Bytes,
}

impl PublishRequest {
    pub fn new(subject: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
        }
    }
}

/// A publish accepted into the client's outbound buffer.
///
/// Acceptance is not delivery: the broker has not acknowledged anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResponse {
    pub subject: String,
    pub payload_bytes: usize,
}
