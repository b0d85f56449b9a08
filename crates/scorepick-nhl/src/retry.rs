// Per-request retry with exponential backoff.
//
// Only network-level failures are retried. A well-formed HTTP error or an
// undecodable body is logged once and degrades to "no data"; callers never
// see an error, only `None`.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, warn};

use scorepick_core::config::ApiConfig;

/// Failure of a single request attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or body-read failure. Retried.
    #[error("network error: {message}")]
    Transport { message: String },

    /// The server answered with a non-success status. Not retried.
    #[error("HTTP {status}")]
    Status { status: u16, body: String },

    /// The body was not the expected JSON shape. Not retried.
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transport { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport {
            message: e.to_string(),
        }
    }
}

/// Attempt budget and backoff schedule for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt. Doubles for each later attempt.
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(api: &ApiConfig) -> Self {
        RetryPolicy {
            max_attempts: api.max_attempts.max(1),
            initial_backoff: Duration::from_millis(api.initial_backoff_ms),
        }
    }

    /// Delay after the `failures`-th consecutive failure (1-based).
    pub fn delay_after(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1u32 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

/// Run `op` until it succeeds, fails non-transiently, or the attempt budget
/// is spent. Returns `None` for every failure outcome.
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Some(value),
            Err(e) if e.is_transient() => {
                if attempt == attempts {
                    error!("{what}: giving up after {attempts} attempts: {e}");
                    break;
                }
                let delay = policy.delay_after(attempt);
                warn!("{what}: attempt {attempt}/{attempts} failed ({e}); retrying in {delay:?}");
                sleep(delay).await;
            }
            Err(FetchError::Status { status, body }) => {
                error!("{what}: HTTP {status}:\n{}", indent_body(&body));
                return None;
            }
            Err(e) => {
                error!("{what}: {e}");
                return None;
            }
        }
    }
    None
}

/// Pretty-print a JSON body (raw text otherwise), indented one tab for logs.
pub fn indent_body(body: &str) -> String {
    let text = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| body.to_string());
    if text.is_empty() {
        return "\t<no response body>".to_string();
    }
    text.lines()
        .map(|line| format!("\t{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
