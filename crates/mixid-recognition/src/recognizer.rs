// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mixid_domain::Match;
use tracing::{debug, warn};

use crate::delay::Delay;
use crate::error::{RecognitionError, Result};

/// One recognition attempt against an external service.
///
/// `Ok(None)` is an explicit "no match" and is never retried.
#[async_trait]
pub trait RecognitionService: Send + Sync {
    /// Identify a raw mono 16 kHz s16le segment.
    async fn identify(&self, pcm: &[u8]) -> Result<Option<Match>>;
}

#[async_trait]
impl<S: RecognitionService + ?Sized> RecognitionService for Arc<S> {
    async fn identify(&self, pcm: &[u8]) -> Result<Option<Match>> {
        (**self).identify(pcm).await
    }
}

/// Bounded exponential backoff for rate-limited responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Surface the first rate-limited response without retrying.
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Wait before retry number `attempt` (0-based): `base * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Total requests allowed for one segment, the first included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(10))
    }
}

/// Recognition client that applies a `RetryPolicy` around a service.
pub struct Recognizer<S> {
    service: S,
    policy: RetryPolicy,
    delay: Arc<dyn Delay>,
}

impl<S: RecognitionService> Recognizer<S> {
    pub fn new(service: S, policy: RetryPolicy, delay: Arc<dyn Delay>) -> Self {
        Self {
            service,
            policy,
            delay,
        }
    }

    /// Recognize one segment, retrying only while the service is rate limiting.
    ///
    /// # Errors
    /// - `RateLimitExhausted` once every allowed attempt was rate limited.
    /// - Any other service error, immediately.
    pub async fn recognize(&self, pcm: &[u8]) -> Result<Option<Match>> {
        let mut attempt = 0u32;
        loop {
            match self.service.identify(pcm).await {
                Ok(found) => {
                    debug!(target: "recognition", attempts = attempt + 1, matched = found.is_some(), "recognition finished");
                    return Ok(found);
                }
                Err(err) if err.is_rate_limited() => {
                    if attempt + 1 >= self.policy.max_attempts() {
                        warn!(target: "recognition", attempts = attempt + 1, error = %err, "rate limit retries exhausted");
                        return Err(RecognitionError::RateLimitExhausted {
                            attempts: attempt + 1,
                        });
                    }
                    let wait = self.policy.backoff(attempt);
                    warn!(
                        target: "recognition",
                        attempt = attempt + 1,
                        delay = ?wait,
                        "rate limited, waiting before retry"
                    );
                    self.delay.wait(wait).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
