use crate::domain::{AisFeed, LineStream};
use async_trait::async_trait;
use chrono::NaiveDate;
use common::domain::{DomainError, DomainResult};
use futures::{StreamExt, TryStreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tokio_util::io::StreamReader;
use tracing::{error, info, instrument};

pub const DEFAULT_API_BASE_URL: &str = "https://live.ais.barentswatch.no/live/v1";

const MODEL_QUERY: [(&str, &str); 2] = [("modelType", "Full"), ("modelFormat", "Json")];

#[derive(Clone)]
pub struct BarentsWatchConfig {
    pub base_url: String,
    pub token: String,
    /// Bounds connecting and the wait for response headers. Reading a
    /// response body is unbounded.
    pub timeout: Duration,
}

/// HTTP client for the BarentsWatch live AIS API
pub struct BarentsWatchClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl BarentsWatchClient {
    pub fn new(config: BarentsWatchConfig) -> DomainResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
            timeout: config.timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl AisFeed for BarentsWatchClient {
    #[instrument(skip(self))]
    async fn fetch_backfill(&self, since: NaiveDate) -> DomainResult<Vec<Value>> {
        let url = self.url("latest/combined");
        let since = since.format("%Y-%m-%d").to_string();

        let request = self
            .http
            .get(&url)
            .query(&[("since", since.as_str())])
            .query(&MODEL_QUERY)
            .bearer_auth(&self.token);

        let response = self.send(request, &url).await.inspect_err(|e| {
            error!(url = %url, error = %e, "Historical AIS request failed");
        })?;

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| DomainError::transport(&url, e))
    }

    #[instrument(skip(self))]
    async fn open_stream(&self) -> DomainResult<LineStream> {
        let url = self.url("combined");

        let request = self
            .http
            .get(&url)
            .query(&MODEL_QUERY)
            .bearer_auth(&self.token);

        let response = self.send(request, &url).await?;

        info!(url = %url, "Connected to AIS stream");

        Ok(response_lines(response, url))
    }
}

impl BarentsWatchClient {
    /// Send `request`, waiting at most `timeout` for the response headers.
    /// Reading the body afterwards is not time-bounded.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> DomainResult<reqwest::Response> {
        tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| {
                DomainError::transport(url, format!("no response within {:?}", self.timeout))
            })?
            .and_then(|response| response.error_for_status())
            .map_err(|e| DomainError::transport(url, e))
    }
}

/// Split a streaming response body into non-blank lines.
///
/// Framing works on raw bytes; invalid UTF-8 is replaced rather than
/// rejected, so a corrupt record fails validation on its own instead of
/// ending the stream.
fn response_lines(response: reqwest::Response, url: String) -> LineStream {
    let body = StreamReader::new(response.bytes_stream().map_err(std::io::Error::other));

    FramedRead::new(body, AnyDelimiterCodec::new(b"\n".to_vec(), Vec::new()))
        .filter_map(move |chunk| {
            let result = match chunk {
                Ok(bytes) => {
                    let line = String::from_utf8_lossy(&bytes);
                    let line = line.trim();
                    (!line.is_empty()).then(|| Ok(line.to_string()))
                }
                Err(e) => Some(Err(DomainError::transport(url.as_str(), e))),
            };
            futures::future::ready(result)
        })
        .boxed()
}
