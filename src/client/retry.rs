//! Retry classification for upstream responses.
//!
//! - 429: exponential backoff (1 s, 2 s, 4 s), or the upstream's
//!   `Retry-After` if that is longer, then [`ClientError::RateLimited`].
//! - 5xx and transport failures: linear backoff (1 s, 2 s, 3 s), then the
//!   last error.
//! - Other 4xx: no retry.

use std::time::Duration;

use super::transport::{HttpResponse, TransportError};
use crate::error::ClientError;

/// What to do with one attempt's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// 2xx: hand the response to the caller.
    Done(HttpResponse),
    /// Sleep, then send again.
    Retry(Duration),
    /// Give up with this error.
    Fail(ClientError),
}

/// Bounded retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// First 429 backoff; doubles on each retry.
    pub rate_limit_base: Duration,
    /// 5xx/transport backoff step; grows linearly.
    pub server_error_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            rate_limit_base: Duration::from_secs(1),
            server_error_step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            rate_limit_base: Duration::ZERO,
            server_error_step: Duration::ZERO,
        }
    }

    /// Classifies the outcome of attempt number `retries_done + 1`.
    #[must_use]
    pub fn decide(
        &self,
        outcome: Result<HttpResponse, TransportError>,
        retries_done: u32,
    ) -> Decision {
        let can_retry = retries_done < self.max_retries;
        let response = match outcome {
            Ok(response) => response,
            Err(TransportError(message)) if can_retry => {
                tracing::warn!(error = %message, attempt = retries_done + 1, "transport error");
                return Decision::Retry(self.linear_backoff(retries_done));
            }
            Err(TransportError(message)) => return Decision::Fail(ClientError::NetworkError(message)),
        };

        match response.status {
            _ if response.is_success() => Decision::Done(response),
            429 if can_retry => {
                let backoff = self.exponential_backoff(retries_done);
                Decision::Retry(response.retry_after.map_or(backoff, |hint| hint.max(backoff)))
            }
            429 => Decision::Fail(ClientError::RateLimited {
                attempts: retries_done + 1,
                retry_after: response.retry_after,
            }),
            500..=599 if can_retry => Decision::Retry(self.linear_backoff(retries_done)),
            status => Decision::Fail(ClientError::UpstreamError {
                status,
                body: response.body,
            }),
        }
    }

    fn exponential_backoff(&self, retries_done: u32) -> Duration {
        self.rate_limit_base
            .saturating_mul(2u32.saturating_pow(retries_done))
    }

    fn linear_backoff(&self, retries_done: u32) -> Duration {
        self.server_error_step.saturating_mul(retries_done + 1)
    }
}
