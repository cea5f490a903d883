//! Consecutive-failure circuit breaker.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

/// Circuit breaker parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive transient failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before allowing a trial call.
    pub break_duration: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            break_duration: Duration::from_secs(10),
        }
    }
}

/// Externally visible breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls fail immediately.
    Open,
    /// One trial call is allowed through.
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
enum State {
    Closed { consecutive_failures: u32 },
    Open { until: Instant },
    HalfOpen { trial_in_flight: bool },
}

/// Tracks consecutive failures against one downstream and sheds calls while
/// the downstream is considered unhealthy.
///
/// Every call must first obtain a [`BreakerPermit`] through
/// [`CircuitBreaker::try_acquire`] and then settle it with the outcome.
#[derive(Debug)]
pub struct CircuitBreaker {
    downstream: String,
    config: CircuitBreakerConfig,
    state: Mutex<State>,
}

impl CircuitBreaker {
    /// Creates a closed breaker for `downstream`.
    #[must_use]
    pub fn new(downstream: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            downstream: downstream.into(),
            config,
            state: Mutex::new(State::Closed {
                consecutive_failures: 0,
            }),
        }
    }

    /// Name of the guarded downstream.
    #[must_use]
    pub fn downstream(&self) -> &str {
        &self.downstream
    }

    /// Current state. An open circuit whose break has elapsed reports
    /// `HalfOpen`.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        match *self.lock() {
            State::Closed { .. } => CircuitState::Closed,
            State::Open { until } if Instant::now() < until => CircuitState::Open,
            State::Open { .. } | State::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    /// Asks permission to call the downstream. Returns `None` while the
    /// circuit is open or while a half-open trial call is in flight.
    pub fn try_acquire(&self) -> Option<BreakerPermit<'_>> {
        let mut state = self.lock();
        match *state {
            State::Closed { .. } => Some(BreakerPermit::new(self, false)),
            State::Open { until } if Instant::now() >= until => {
                *state = State::HalfOpen {
                    trial_in_flight: true,
                };
                info!(downstream = %self.downstream, "circuit half-open, allowing trial call");
                Some(BreakerPermit::new(self, true))
            }
            State::HalfOpen {
                trial_in_flight: false,
            } => {
                *state = State::HalfOpen {
                    trial_in_flight: true,
                };
                Some(BreakerPermit::new(self, true))
            }
            State::Open { .. } | State::HalfOpen { .. } => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_success(&self) {
        let mut state = self.lock();
        if !matches!(*state, State::Closed { .. }) {
            info!(downstream = %self.downstream, "circuit closed");
        }
        *state = State::Closed {
            consecutive_failures: 0,
        };
    }

    fn on_failure(&self) {
        let mut state = self.lock();
        match *state {
            State::Closed {
                consecutive_failures,
            } => {
                let failures = consecutive_failures.saturating_add(1);
                if failures >= self.config.failure_threshold {
                    *state = self.open_state();
                    warn!(
                        downstream = %self.downstream,
                        failures,
                        break_ms = self.config.break_duration.as_millis(),
                        "circuit opened"
                    );
                } else {
                    *state = State::Closed {
                        consecutive_failures: failures,
                    };
                }
            }
            State::HalfOpen { .. } => {
                *state = self.open_state();
                warn!(downstream = %self.downstream, "trial call failed, circuit re-opened");
            }
            State::Open { .. } => {}
        }
    }

    fn on_abandon(&self) {
        let mut state = self.lock();
        if let State::HalfOpen {
            trial_in_flight: true,
        } = *state
        {
            *state = State::HalfOpen {
                trial_in_flight: false,
            };
        }
    }

    fn open_state(&self) -> State {
        State::Open {
            until: Instant::now() + self.config.break_duration,
        }
    }
}

/// Permission for a single downstream call. Settle it with
/// [`record_success`](Self::record_success) or
/// [`record_failure`](Self::record_failure); dropping it unsettled frees a
/// half-open trial slot without changing the failure count.
#[derive(Debug)]
pub struct BreakerPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl<'a> BreakerPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            settled: false,
        }
    }

    /// The call got a healthy answer (including a non-transient rejection).
    pub fn record_success(mut self) {
        self.settled = true;
        self.breaker.on_success();
    }

    /// The call failed transiently.
    pub fn record_failure(mut self) {
        self.settled = true;
        self.breaker.on_failure();
    }
}

impl Drop for BreakerPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.breaker.on_abandon();
        }
    }
}
