//! Retry policy for GitHub API requests

use std::time::Duration;

/// Upper bound for a single backoff sleep
const MAX_DELAY_MS: u64 = 30_000;

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: usize,
    /// Delay before the second attempt; doubles afterwards
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no sleeping
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 1,
        }
    }

    /// Delay before attempt `attempt + 1`
    ///
    /// A server-provided `Retry-After` wins but never undercuts the base delay.
    pub fn delay(&self, attempt: usize, retry_after: Option<Duration>) -> Duration {
        if let Some(delay) = retry_after {
            return delay.max(Duration::from_millis(self.base_delay_ms));
        }
        let exponent = attempt.saturating_sub(1).min(10) as u32;
        let scaled = self
            .base_delay_ms
            .saturating_mul(2_u64.saturating_pow(exponent));
        Duration::from_millis(scaled.min(MAX_DELAY_MS))
    }
}

/// Parse a `Retry-After` header given in seconds
pub fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    let raw = headers.get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
    let seconds = raw.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(seconds))
}

/// 429 and 5xx are worth another attempt
#[inline]
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

/// Timeouts and connection failures are worth another attempt
#[inline]
pub fn is_retryable_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// Methods GitHub applies at most once no matter how often they are sent
#[inline]
pub fn is_idempotent(method: &reqwest::Method) -> bool {
    matches!(
        *method,
        reqwest::Method::GET | reqwest::Method::HEAD | reqwest::Method::PATCH | reqwest::Method::PUT
    )
}

/// Status retry rule per method
///
/// A create may already have been stored when a 5xx comes back, so only a
/// 429 (rejected before processing) replays it.
#[inline]
pub fn should_retry_status(method: &reqwest::Method, status: u16) -> bool {
    if is_idempotent(method) {
        is_retryable_status(status)
    } else {
        status == 429
    }
}

/// Transport retry rule per method
///
/// A create is replayed only when the connection was never established.
#[inline]
pub fn should_retry_transport_error(method: &reqwest::Method, error: &reqwest::Error) -> bool {
    if is_idempotent(method) {
        is_retryable_transport_error(error)
    } else {
        error.is_connect()
    }
}

/// Cap response bodies quoted in error messages
pub fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
