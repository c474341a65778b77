//! Bounded-timeout GET with exponential backoff.
//!
//! Only transport failures (connect errors, timeouts) are retried. Any HTTP
//! response, whatever its status, ends the loop and is handed back for
//! validation.

use crate::auth::AuthToken;
use crate::config::ArgoCdConfig;
use crate::endpoint::UpstreamEndpoint;
use crate::errors::{GatewayError, TransportFailure};
use crate::metrics_defs::{UPSTREAM_ATTEMPTS, UPSTREAM_RETRIES};
use crate::transport::{RawResponse, Transport};
use shared::counter;
use std::time::Duration;
use tokio::time::{sleep, timeout};

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Total attempts, including the first one. Always at least 1.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ArgoCdConfig) -> Self {
        RetryPolicy {
            timeout: config.timeout(),
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// Delay after the failed attempt `attempt` (0-based): `base * 2^attempt`, capped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(self.backoff_max)
            .min(self.backoff_max)
    }

    /// Sum of every backoff delay a call can sleep through before giving up
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.delay_for_attempt(attempt))
            .sum()
    }
}

/// Performs one authenticated GET against `endpoint`, retrying transient
/// transport failures according to `policy`.
pub async fn fetch_with_retry(
    transport: &dyn Transport,
    endpoint: &UpstreamEndpoint,
    token: &AuthToken,
    policy: &RetryPolicy,
) -> Result<RawResponse, GatewayError> {
    let resource = endpoint.resource().as_str();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        counter!(UPSTREAM_ATTEMPTS, "resource" => resource).increment(1);
        tracing::debug!(resource, attempt, "Fetching from upstream");

        let failure = match timeout(policy.timeout, transport.get(endpoint.url(), token)).await {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(failure)) => failure,
            Err(_elapsed) => TransportFailure::Timeout,
        };

        if attempt >= max_attempts || !failure.is_retryable() {
            tracing::error!(resource, attempt, error = %failure, "Upstream fetch failed");
            return Err(GatewayError::Transport {
                endpoint: resource.to_string(),
                attempts: attempt,
                failure,
            });
        }

        let delay = policy.delay_for_attempt(attempt - 1);
        tracing::warn!(
            resource,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %failure,
            "Upstream fetch failed, retrying"
        );
        counter!(UPSTREAM_RETRIES, "resource" => resource).increment(1);
        sleep(delay).await;
    }
}
