//! Shared REST plumbing for exchange adapters: a reqwest client with retry
//! and backoff, plus lenient number parsing for exchange payloads.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{AppError, Result};

/// Delay added per attempt between retries (attempt × step).
const BACKOFF_STEP: Duration = Duration::from_secs(2);

/// HTTP GET client with linear backoff on transient failures.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    backoff_step: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with a request timeout and retry budget.
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        let client = Client::builder()
            .user_agent("smc-signals/0.1")
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            max_retries: max_retries.max(1),
            backoff_step: BACKOFF_STEP,
        }
    }

    /// Whether a status is worth retrying.
    pub fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    /// GET `url` with `query` and decode the JSON body.
    ///
    /// Timeouts, connection errors, 429 and 5xx responses are retried up to
    /// `max_retries` attempts, sleeping `attempt × 2s` in between. Other
    /// non-success statuses fail immediately.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        source: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let last_attempt = attempt >= self.max_retries;

            match self.client.get(url).query(query).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        debug!("{} GET {} ok", source, url);
                        return Ok(response.json::<T>().await?);
                    }

                    let text = response.text().await.unwrap_or_default();
                    let snippet: String = text.chars().take(200).collect();
                    warn!("{} API returned {}: {}", source, status, snippet);

                    if !Self::is_retryable_status(status) || last_attempt {
                        return Err(AppError::ExternalApi(format!(
                            "{} API error: {}",
                            source, status
                        )));
                    }
                }
                Err(e) => {
                    let transient = e.is_timeout() || e.is_connect();
                    if !transient || last_attempt {
                        return Err(e.into());
                    }
                    warn!("{} request failed (attempt {}): {}", source, attempt, e);
                }
            }

            let delay = self.backoff_step * attempt;
            debug!("{} retrying in {:?}", source, delay);
            tokio::time::sleep(delay).await;
        }
    }
}

/// Read a JSON number or numeric string.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a JSON integer or integer string.
pub fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
