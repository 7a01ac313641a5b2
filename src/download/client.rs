//! HTTP client wrapper with bounded retry.
//!
//! This module provides the `HttpClient` struct, which performs GET requests
//! and retries them under a fixed-delay [`RetryPolicy`] until the server
//! answers `200 OK`.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, Response, StatusCode};
use tracing::{debug, instrument};

use super::constants::CONNECT_TIMEOUT_SECS;
use super::error::FetchError;
use super::retry::{RetryDecision, RetryPolicy};
use crate::user_agent;

/// HTTP client shared by the paginator and every worker.
///
/// This client is designed to be created once and cloned into each task,
/// taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use ooni_downloader::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let response = client
///     .get_with_retry("https://measurements.ooni.torproject.org/api/v1/files")
///     .await?;
/// println!("status: {}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry_policy: RetryPolicy,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with the default retry policy.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::with_retry_policy(RetryPolicy::default())
    }

    /// Creates a new HTTP client with an explicit retry policy.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_retry_policy(retry_policy: RetryPolicy) -> Self {
        let client = base_client_builder(CONNECT_TIMEOUT_SECS)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            retry_policy,
        }
    }

    /// Returns the retry policy applied to every fetch.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Issues a GET, retrying until the server answers `200 OK`.
    ///
    /// Any other status, and any network-level failure, consumes one attempt
    /// and is followed by the policy's fixed delay, except after the final
    /// attempt. Callers receive the successful response with its body still
    /// unread, or a single [`FetchError`] once the budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::TooManyFailures`] carrying the URL and the last
    /// observed status if no attempt succeeds.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_with_retry(&self, url: &str) -> Result<Response, FetchError> {
        let mut attempt = 0u32;
        let mut last_status: Option<u16> = None;

        loop {
            attempt += 1;

            let last_failure = match self.client.get(url).send().await {
                Ok(response) if response.status() == StatusCode::OK => {
                    debug!(attempt, "request succeeded");
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status();
                    last_status = Some(status.as_u16());
                    debug!(attempt, status = %status, "unexpected response status");
                    status.to_string()
                }
                Err(error) => {
                    debug!(attempt, error = %error, "request failed");
                    format!("network error: {error}")
                }
            };

            match self.retry_policy.should_retry(attempt) {
                RetryDecision::Retry { delay, attempt: next } => {
                    debug!(next_attempt = next, delay_ms = delay.as_millis(), "retrying request");
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(attempts = attempt, %reason, last_failure = %last_failure, "giving up on request");
                    return Err(FetchError::too_many_failures(
                        url,
                        attempt,
                        last_status,
                        last_failure,
                    ));
                }
            }
        }
    }

}

fn base_client_builder(connect_timeout_secs: u64) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
}
