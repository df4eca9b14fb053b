//! Circuit breaker for operation protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: testing if the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= failure_threshold
//! Open → Half-Open: recovery_timeout elapsed since the last failure
//! Half-Open → Closed: half_open_max_calls consecutive trial successes
//! Half-Open → Open: any trial failure
//! ```
//!
//! The state lock is held only to admit a call and to record its outcome,
//! never while the operation runs. Half-Open admits one trial at a time.

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::{BoxError, FailoverError};
use crate::resilience::timeouts::with_deadline;

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Time since the last failure before a trial call is allowed.
    pub recovery_timeout: Duration,
    /// Per-call deadline.
    pub call_timeout: Duration,
    /// Consecutive trial successes required to close the circuit.
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            call_timeout: Duration::from_secs(30),
            half_open_max_calls: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
    success_count: u32,
    trial_in_flight: bool,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure: None,
            success_count: 0,
            trial_in_flight: false,
        }
    }
}

/// How a call was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Normal,
    Trial,
}

/// Failure isolation state machine.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::named("default", config)
    }

    /// A breaker whose logs and state gauge carry `name`.
    pub fn named(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(BreakerState::closed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state, without triggering any transition.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Consecutive failures counted so far.
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// Force the breaker back to Closed.
    pub fn reset(&self) {
        *self.lock() = BreakerState::closed();
        crate::observability::metrics::record_circuit_state(&self.name, CircuitState::Closed);
    }

    /// Run `operation` through the breaker under the configured call timeout.
    ///
    /// Rejected calls return [`FailoverError::CircuitOpen`] and never invoke
    /// `operation`.
    pub async fn call<T, F, Fut>(&self, operation: F) -> Result<T, FailoverError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, BoxError>>,
    {
        let admission = self.admit()?;
        let mut permit = Permit { breaker: self, admission, settled: false };

        let result = with_deadline(self.config.call_timeout, operation()).await;

        permit.settled = true;
        self.record(admission, result.is_ok());
        result
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit(&self) -> Result<Admission, FailoverError> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Ok(Admission::Normal),
            CircuitState::Open => {
                let recovered = inner
                    .last_failure
                    .map_or(true, |at| at.elapsed() >= self.config.recovery_timeout);
                if !recovered {
                    return Err(FailoverError::CircuitOpen);
                }
                inner.state = CircuitState::HalfOpen;
                inner.success_count = 0;
                inner.trial_in_flight = true;
                drop(inner);

                tracing::info!(breaker = %self.name, "Circuit breaker half-open, admitting trial call");
                crate::observability::metrics::record_circuit_state(&self.name, CircuitState::HalfOpen);
                Ok(Admission::Trial)
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    return Err(FailoverError::CircuitOpen);
                }
                inner.trial_in_flight = true;
                Ok(Admission::Trial)
            }
        }
    }

    fn record(&self, admission: Admission, success: bool) {
        let mut inner = self.lock();
        let before = inner.state;

        match (admission, success) {
            (Admission::Normal, true) => {
                if inner.state == CircuitState::Closed {
                    inner.failure_count = 0;
                    inner.last_failure = None;
                }
            }
            (Admission::Normal, false) => {
                inner.failure_count = inner.failure_count.saturating_add(1);
                inner.last_failure = Some(Instant::now());
                if inner.state == CircuitState::Closed
                    && inner.failure_count >= self.config.failure_threshold
                {
                    inner.state = CircuitState::Open;
                }
            }
            (Admission::Trial, true) => {
                inner.trial_in_flight = false;
                inner.success_count += 1;
                if inner.success_count >= self.config.half_open_max_calls {
                    *inner = BreakerState::closed();
                }
            }
            (Admission::Trial, false) => {
                inner.trial_in_flight = false;
                inner.success_count = 0;
                inner.failure_count = inner.failure_count.saturating_add(1);
                inner.last_failure = Some(Instant::now());
                inner.state = CircuitState::Open;
            }
        }

        let after = inner.state;
        let failures = inner.failure_count;
        drop(inner);

        if before != after {
            match after {
                CircuitState::Open => tracing::warn!(breaker = %self.name, failures, "Circuit breaker opened"),
                CircuitState::Closed => tracing::info!(breaker = %self.name, "Circuit breaker closed"),
                CircuitState::HalfOpen => {}
            }
            crate::observability::metrics::record_circuit_state(&self.name, after);
        }
    }
}

/// Records an admitted call as failed if the caller drops it mid-flight.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    admission: Admission,
    settled: bool,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.record(self.admission, false);
        }
    }
}
