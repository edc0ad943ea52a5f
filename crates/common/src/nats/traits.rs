use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Trait for core NATS publish operations
/// Abstracts the buffered publish/flush/drain lifecycle of a single connection
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CorePublisher: Send + Sync {
    /// Hand a message to the client's outbound buffer without waiting for the server
    async fn publish(&self, subject: String, payload: Bytes) -> Result<()>;

    /// Wait until everything buffered so far has been written to the server
    async fn flush(&self) -> Result<()>;

    /// Stop accepting publishes, flush what is buffered, then close the connection
    async fn drain(&self) -> Result<()>;
}
