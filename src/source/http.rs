//! HTTP feed fetcher backed by [`reqwest`].

use async_trait::async_trait;
use tracing::trace;

use super::FeedFetcher;
use crate::error::SourceError;

/// Fetches feeds with a shared [`reqwest::Client`].
///
/// The client keeps reqwest's default timeouts; the pipeline imposes none of
/// its own.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher that identifies itself with `user_agent`.
    pub fn new(user_agent: &str) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        trace!(url, bytes = body.len(), "fetched feed");
        Ok(body.to_vec())
    }
}
