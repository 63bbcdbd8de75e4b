//! HTTP client for catalog requests
//!
//! Exchange metadata and bucket listings are small, idempotent GETs, so they
//! are retried with exponential backoff on:
//! - Network errors (timeout, connection refused)
//! - 5xx server errors
//! - 429 rate limit errors
//!
//! Other 4xx responses fail immediately. Archive downloads do not go through
//! this client; they are single-attempt.

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::downloader::config::{calculate_backoff, MAX_RETRIES};
use crate::fetcher::{FetcherError, FetcherResult};
use crate::metrics;

/// Catalog HTTP client with retry
#[derive(Debug, Clone)]
pub struct CatalogHttpClient {
    client: Client,
    max_retries: u32,
    backoff_base: Option<Duration>,
}

impl Default for CatalogHttpClient {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl CatalogHttpClient {
    /// Wrap a shared reqwest client
    pub fn new(client: Client) -> Self {
        Self {
            client,
            max_retries: MAX_RETRIES,
            backoff_base: None,
        }
    }

    /// Override retry count and use a fixed backoff (for tests)
    pub fn with_retry_policy(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff_base = Some(backoff);
        self
    }

    /// GET `url` and deserialize the JSON body
    pub async fn get_json<T>(&self, url: &str, endpoint: &str) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let body = self.get_text(url, &[], endpoint).await?;
        serde_json::from_str(&body)
            .map_err(|e| FetcherError::ParseError(format!("Failed to deserialize response: {e}")))
    }

    /// GET `url` with query parameters and return the body as text
    ///
    /// `endpoint` is a short label used for logs and metrics.
    pub async fn get_text(
        &self,
        url: &str,
        params: &[(&str, &str)],
        endpoint: &str,
    ) -> FetcherResult<String> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            debug!(url = %url, endpoint = %endpoint, attempt = attempt + 1, "Catalog request");

            let response = match self.client.get(url).query(params).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    metrics::record_catalog_request(endpoint, None);
                    warn!(
                        "Network error on attempt {}/{}: {}",
                        attempt + 1,
                        self.max_retries + 1,
                        e
                    );
                    last_error = Some(FetcherError::NetworkError(e.to_string()));
                    if attempt < self.max_retries {
                        self.backoff(attempt).await;
                        continue;
                    }
                    break;
                }
            };

            let status = response.status();
            metrics::record_catalog_request(endpoint, Some(status.as_u16()));

            if status.as_u16() == 429 || status.is_server_error() {
                warn!(
                    "HTTP {} on attempt {}/{} for {}",
                    status,
                    attempt + 1,
                    self.max_retries + 1,
                    endpoint
                );
                last_error = Some(FetcherError::HttpError(format!("Server error: {status}")));
                if attempt < self.max_retries {
                    self.backoff(attempt).await;
                    continue;
                }
                break;
            }

            if status.as_u16() == 404 {
                return Err(FetcherError::NotFound(url.to_string()));
            }

            if status.is_client_error() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(FetcherError::HttpError(format!(
                    "Client error {status}: {error_text}"
                )));
            }

            return response
                .text()
                .await
                .map_err(|e| FetcherError::NetworkError(e.to_string()));
        }

        Err(last_error
            .unwrap_or_else(|| FetcherError::NetworkError("All retries exhausted".to_string())))
    }

    async fn backoff(&self, attempt: u32) {
        let delay = self.backoff_base.unwrap_or_else(|| calculate_backoff(attempt));
        debug!("Retrying after {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}
