use reqwest::{RequestBuilder, Response};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

use crate::{config::Upstream, Error};

/// Statuses the sheet host returns while it is briefly unavailable.
const RETRYABLE_STATUS_CODES: &[u16] = &[502, 503, 504];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Doubles per attempt: 100ms, 200ms, 400ms, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// HTTP access to the sheet macro with a per-request timeout and bounded
/// retry on transient failures.
#[derive(Debug, Clone)]
pub struct SheetClient {
    client: reqwest::Client,
    url: Arc<String>,
    retry: RetryPolicy,
}

impl SheetClient {
    pub fn new_w_client(client: reqwest::Client, url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            url: Arc::new(url.into()),
            retry,
        }
    }

    pub fn new(url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new_w_client(client, url, retry))
    }

    pub fn from_settings(upstream: &Upstream) -> Result<Self, Error> {
        let retry = RetryPolicy {
            max_retries: upstream.max_retries,
            initial_backoff: upstream.initial_backoff(),
        };
        Self::new(upstream.url.clone(), upstream.timeout(), retry)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn get(&self, query: &[(&str, &str)]) -> Result<Response, Error> {
        debug!(url = %self.url, ?query, "GET sheet");
        self.send(|| self.client.get(self.url.as_str()).query(query)).await
    }

    pub async fn post<T: Serialize + ?Sized>(&self, body: &T) -> Result<Response, Error> {
        debug!(url = %self.url, "POST sheet");
        self.send(|| self.client.post(self.url.as_str()).json(body)).await
    }

    /// Runs the request built by `build`, retrying connect errors, timeouts
    /// and 502/503/504 up to `max_retries` times. Any other non-success
    /// status is an error straight away.
    async fn send<F>(&self, build: F) -> Result<Response, Error>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;

        loop {
            let outcome = build().send().await;

            let retryable = match &outcome {
                Ok(res) => RETRYABLE_STATUS_CODES.contains(&res.status().as_u16()),
                Err(e) => e.is_connect() || e.is_timeout(),
            };

            if retryable && attempt < self.retry.max_retries {
                let backoff = self.retry.backoff(attempt);
                warn!(
                    status = ?outcome.as_ref().ok().map(|res| res.status()),
                    error = ?outcome.as_ref().err(),
                    attempt = attempt + 1,
                    max_attempts = self.retry.max_retries.saturating_add(1),
                    backoff_ms = backoff.as_millis() as u64,
                    "Transient sheet failure, backing off"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            let res = outcome?;
            let status = res.status();
            if !status.is_success() {
                return Err(Error::UpstreamStatus(status));
            }

            return Ok(res);
        }
    }
}
