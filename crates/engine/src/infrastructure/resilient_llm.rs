//! Retry layer for the text backend.
//!
//! Transient failures (transport errors, rate limits, 5xx) are retried with
//! capped exponential backoff. A `Retry-After` hint from the backend replaces
//! the computed delay. Everything else is returned on the first attempt so the
//! generation pipeline can fall back to its defaults.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::ports::{LlmError, LlmPort, LlmRequest, LlmResponse, RandomPort};

/// How many times and how long to wait between attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = single attempt)
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Upper bound for both computed and server-requested delays
    pub max_delay_ms: u64,
    /// Jitter as a percentage of the computed delay, applied in both directions
    pub jitter_percent: u8,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            jitter_percent: 20,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based), before jitter.
    pub fn base_delay(&self, retry: u32) -> u64 {
        let factor = 1u64
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u64::MAX);
        self.base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }
}

/// Wraps a text backend and retries its transient failures
pub struct ResilientLlmClient {
    inner: Arc<dyn LlmPort>,
    policy: RetryPolicy,
    random: Arc<dyn RandomPort>,
}

impl ResilientLlmClient {
    pub fn new(inner: Arc<dyn LlmPort>, policy: RetryPolicy, random: Arc<dyn RandomPort>) -> Self {
        Self {
            inner,
            policy,
            random,
        }
    }

    fn delay_for(&self, retry: u32, error: &LlmError) -> u64 {
        if let Some(seconds) = error.retry_after() {
            return seconds.saturating_mul(1_000).min(self.policy.max_delay_ms);
        }

        let delay = self.policy.base_delay(retry);
        let spread = delay.saturating_mul(u64::from(self.policy.jitter_percent)) / 100;
        let spread = i32::try_from(spread).unwrap_or(i32::MAX);
        if spread == 0 {
            return delay;
        }
        let jitter = self.random.gen_range(-spread, spread);
        delay.saturating_add_signed(i64::from(jitter))
    }
}

#[async_trait]
impl LlmPort for ResilientLlmClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let mut retry = 0;
        loop {
            let error = match self.inner.generate(request.clone()).await {
                Ok(response) => {
                    if retry > 0 {
                        tracing::info!(retries = retry, "Text backend recovered after retry");
                    }
                    return Ok(response);
                }
                Err(error) => error,
            };

            if !error.is_transient() {
                tracing::warn!(error = %error, "Text backend failed permanently");
                return Err(error);
            }
            if retry >= self.policy.max_retries {
                tracing::warn!(
                    attempts = retry + 1,
                    error = %error,
                    "Text backend still failing, giving up"
                );
                return Err(error);
            }

            retry += 1;
            let delay_ms = self.delay_for(retry, &error);
            tracing::warn!(
                retry,
                max_retries = self.policy.max_retries,
                delay_ms,
                error = %error,
                "Transient text backend failure, retrying"
            );
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }
}
