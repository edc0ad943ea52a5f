use async_trait::async_trait;
use chrono::NaiveDate;
use common::domain::DomainResult;
use futures::stream::BoxStream;
use serde_json::Value;

/// Lines of the live feed, one JSON record per item, in arrival order.
///
/// Dropping the stream closes the underlying connection.
pub type LineStream = BoxStream<'static, DomainResult<String>>;

/// Source of raw AIS records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AisFeed: Send + Sync {
    /// Fetch every record reported since `since` as one bounded batch
    async fn fetch_backfill(&self, since: NaiveDate) -> DomainResult<Vec<Value>>;

    /// Open the live feed. Fails with a Transport error if the upstream
    /// does not answer with a success status.
    async fn open_stream(&self) -> DomainResult<LineStream>;
}
