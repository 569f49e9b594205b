//! HTTP fetcher with bounded retries and linear backoff

use crate::{AttemptError, DocumentSource, IngestError, IngestResult};
use reqwest::Client;
use serde_json::Value;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Retry/timeout settings for one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Total attempts, including the first (at least one is always made)
    pub max_retries: u32,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Sleep after attempt `n` fails is `backoff_base * n`
    pub backoff_base: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_secs(20),
            backoff_base: Duration::from_secs(2),
        }
    }
}

impl FetchPolicy {
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff_base * attempt
    }

    fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Fetches the upstream JSON document over HTTP
pub struct HttpFetcher {
    client: Client,
    url: String,
    policy: FetchPolicy,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>, policy: FetchPolicy) -> IngestResult<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(IngestError::InvalidSource("empty source URL".into()));
        }
        let client = Client::builder()
            .timeout(policy.timeout)
            .build()
            .map_err(|e| IngestError::InvalidSource(e.to_string()))?;
        Ok(Self {
            client,
            url,
            policy,
        })
    }

    async fn attempt(&self) -> Result<Value, AttemptError> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AttemptError::Status(status));
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait::async_trait]
impl DocumentSource for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self) -> IngestResult<Value> {
        let attempts = self.policy.attempts();
        let mut attempt = 1;
        loop {
            match self.attempt().await {
                Ok(doc) => {
                    debug!(url = %self.url, attempt, "fetched document");
                    return Ok(doc);
                }
                Err(e) if attempt >= attempts => {
                    warn!(url = %self.url, attempt, attempts, error = %e, "fetch attempt failed");
                    return Err(IngestError::Fetch {
                        url: self.url.clone(),
                        attempts,
                        last: e,
                    });
                }
                Err(e) => {
                    let backoff = self.policy.backoff_after(attempt);
                    warn!(
                        url = %self.url,
                        attempt,
                        attempts,
                        error = %e,
                        backoff_ms = backoff.as_millis() as u64,
                        "fetch attempt failed, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
