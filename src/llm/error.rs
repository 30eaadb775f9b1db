//! Failures of the chat completions client and the retry policy applied to them.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM returned HTTP {status}: {body}")]
    Status {
        status: StatusCode,
        body: String,
        retry_after: Option<Duration>,
    },

    #[error("Unexpected LLM response: {0}")]
    Malformed(String),
}

impl LlmError {
    /// Timeouts, refused connections, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Transport(e) => e.is_timeout() || e.is_connect(),
            LlmError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            LlmError::Malformed(_) => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// How many times a retryable call is attempted and how long to wait in between.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Wait before retrying after the `attempt`-th failure (0-based).
    ///
    /// A server-provided `Retry-After` wins; otherwise the base delay doubles per attempt.
    /// Either way the wait never exceeds `max_delay`.
    pub fn delay_for(&self, attempt: u32, error: &LlmError) -> Duration {
        let wait = error.retry_after().unwrap_or_else(|| {
            self.base_delay
                .saturating_mul(2u32.saturating_pow(attempt.min(16)))
        });
        wait.min(self.max_delay)
    }
}
