//! HTTP transport with a narrow retry policy
//!
//! One request per call. For the legacy API, transient failures are retried
//! with exponential backoff and jitter: timeouts, connection failures, 5xx
//! answers, and 200 answers whose per-recipient results report a retryable
//! error code. The v1 path is never retried.

use fcm_common::{create_client, FcmError};
use fcm_config::RetryConfig;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

use crate::request::{FcmRequest, Headers};
use crate::response::{LegacyBatchBody, RawResponse};

/// Per-recipient error codes worth another attempt
pub const RETRYABLE_ERRORS: [&str; 4] = [
    "Unavailable",
    "InternalServerError",
    "DeviceMessageRateExceeded",
    "TopicsMessageRateExceeded",
];

/// Whether a request may be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Legacy API: retry transient failures up to `max_retries` times
    Transient,
    /// Single attempt
    Never,
}

/// Issues [`FcmRequest`]s over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct Connection {
    http: reqwest::Client,
    retry: RetryConfig,
}

impl Connection {
    pub fn new(timeout: Duration, retry: RetryConfig) -> Result<Self, FcmError> {
        Ok(Self {
            http: create_client(timeout)?,
            retry,
        })
    }

    /// Sends `request`, retrying according to `policy`.
    ///
    /// When retries run out on a retryable answer, that answer is returned as
    /// is so it can still be normalized. Transport failures become
    /// [`FcmError::Transport`].
    pub async fn execute(
        &self,
        request: &FcmRequest,
        policy: RetryPolicy,
    ) -> Result<RawResponse, FcmError> {
        let max_retries = match policy {
            RetryPolicy::Transient => self.retry.max_retries,
            RetryPolicy::Never => 0,
        };

        let mut attempt = 0;
        loop {
            let result = self.send_once(request).await;
            let retryable = match &result {
                Ok(raw) => is_retryable_response(raw),
                Err(err) => is_retryable_error(err),
            };

            if !retryable || attempt >= max_retries {
                return result.map_err(FcmError::from);
            }

            attempt += 1;
            let delay = backoff_delay(&self.retry, attempt);
            match &result {
                Ok(raw) => warn!(
                    url = %request.url,
                    status = raw.status,
                    "Retry attempt {}/{}, waiting {:?}",
                    attempt, max_retries, delay
                ),
                Err(err) => warn!(
                    url = %request.url,
                    error = %err,
                    "Retry attempt {}/{}, waiting {:?}",
                    attempt, max_retries, delay
                ),
            }
            tokio::time::sleep(delay).await;
        }
    }

    async fn send_once(&self, request: &FcmRequest) -> Result<RawResponse, reqwest::Error> {
        debug!(method = %request.method, url = %request.url, "sending FCM request");

        let mut builder = self.http.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Timeouts and connection failures are transient.
pub fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Any 5xx, or a 200 whose results carry a retryable error code.
pub fn is_retryable_response(raw: &RawResponse) -> bool {
    if (500..=599).contains(&raw.status) {
        return true;
    }
    if raw.status != 200 {
        return false;
    }

    LegacyBatchBody::parse(&raw.body)
        .map(|body| {
            body.results.iter().any(|result| {
                result
                    .error
                    .as_deref()
                    .is_some_and(|code| RETRYABLE_ERRORS.contains(&code))
            })
        })
        .unwrap_or(false)
}

/// Delay before retry number `attempt` (1-based).
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1) as i32;
    let base_ms = config.initial_backoff().as_millis() as f64
        * config.backoff_multiplier.powi(exponent);
    let capped_ms = base_ms.min(config.max_backoff().as_millis() as f64);

    let delay_ms = if config.jitter {
        let factor = rand::thread_rng().gen_range(0.7..1.3); // ±30%
        capped_ms * factor
    } else {
        capped_ms
    };

    Duration::from_millis(delay_ms.max(0.0) as u64)
}
