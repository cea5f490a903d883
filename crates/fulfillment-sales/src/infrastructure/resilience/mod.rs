//! Resilience policy for outbound calls: bounded retry composed with a
//! circuit breaker under one overall deadline.
//!
//! Every attempt passes through the breaker, so transient failures inside a
//! single call count toward opening the circuit. Once open, calls fail
//! immediately without touching the network.

mod circuit_breaker;
mod retry;

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use fulfillment_core::rng::DeterministicRng;
use thiserror::Error;
use tracing::{debug, warn};

pub use circuit_breaker::{BreakerPermit, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::{RetryConfig, Transient};

/// Default overall deadline for one guarded call, across all attempts.
pub const DEFAULT_CALL_DEADLINE: Duration = Duration::from_secs(15);

/// Why a guarded call produced no value.
#[derive(Debug, Error)]
pub enum ResilienceError<E>
where
    E: std::error::Error + 'static,
{
    /// The circuit is open; no attempt was made.
    #[error("circuit for {downstream} is open")]
    CircuitOpen {
        /// The guarded downstream.
        downstream: String,
    },

    /// Every allowed attempt failed transiently.
    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// The failure of the final attempt.
        #[source]
        last_error: E,
    },

    /// The downstream answered with a failure that retrying cannot fix.
    #[error("downstream rejected the request: {0}")]
    Rejected(#[source] E),

    /// The overall deadline elapsed before any attempt succeeded.
    #[error("no answer within {0:?}")]
    DeadlineExceeded(Duration),
}

/// Retry + circuit breaker around calls to one downstream.
///
/// Cloning shares the breaker and the jitter source, so all clones guard
/// the same downstream.
#[derive(Clone)]
pub struct ResiliencePolicy {
    retry: RetryConfig,
    breaker: Arc<CircuitBreaker>,
    deadline: Duration,
    rng: Arc<Mutex<dyn DeterministicRng + Send>>,
}

impl std::fmt::Debug for ResiliencePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResiliencePolicy")
            .field("retry", &self.retry)
            .field("breaker", &self.breaker)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl ResiliencePolicy {
    /// Creates a policy for one downstream.
    #[must_use]
    pub fn new(
        retry: RetryConfig,
        breaker: Arc<CircuitBreaker>,
        deadline: Duration,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    ) -> Self {
        Self {
            retry,
            breaker,
            deadline,
            rng,
        }
    }

    /// The breaker shared by every call made through this policy.
    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Runs `operation` until it succeeds, fails non-transiently, runs out of
    /// attempts, hits an open circuit, or exceeds the deadline.
    ///
    /// `operation` receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// See [`ResilienceError`].
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F) -> Result<T, ResilienceError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + std::error::Error + 'static,
    {
        match tokio::time::timeout(self.deadline, self.attempt_until_settled(&mut operation)).await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    downstream = %self.breaker.downstream(),
                    deadline_ms = self.deadline.as_millis(),
                    "call deadline exceeded"
                );
                Err(ResilienceError::DeadlineExceeded(self.deadline))
            }
        }
    }

    async fn attempt_until_settled<T, E, F, Fut>(
        &self,
        operation: &mut F,
    ) -> Result<T, ResilienceError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + std::error::Error + 'static,
    {
        let mut attempt = 1;
        loop {
            let Some(permit) = self.breaker.try_acquire() else {
                return Err(ResilienceError::CircuitOpen {
                    downstream: self.breaker.downstream().to_owned(),
                });
            };

            match operation(attempt).await {
                Ok(value) => {
                    permit.record_success();
                    return Ok(value);
                }
                Err(error) if error.is_transient() => {
                    permit.record_failure();
                    if attempt >= self.retry.max_attempts {
                        warn!(
                            downstream = %self.breaker.downstream(),
                            attempts = attempt,
                            error = %error,
                            "retries exhausted"
                        );
                        return Err(ResilienceError::RetriesExhausted {
                            attempts: attempt,
                            last_error: error,
                        });
                    }
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    debug!(
                        downstream = %self.breaker.downstream(),
                        next_attempt = attempt,
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    permit.record_success();
                    return Err(ResilienceError::Rejected(error));
                }
            }
        }
    }

    /// Wait before `attempt`, jitter included.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let jitter_ms = self.retry.jitter_ceiling_ms().map_or(0, |ceiling| {
            self.rng
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .next_u32_range(0, ceiling)
        });
        self.retry.nominal_delay(attempt) + Duration::from_millis(u64::from(jitter_ms))
    }
}
