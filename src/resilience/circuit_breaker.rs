//! Circuit breaker for dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: one trial call tests whether the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= failure_threshold
//! Open → Half-Open: first allow() after reset_timeout
//! Half-Open → Closed: trial call succeeds
//! Half-Open → Open: trial call fails
//! ```
//!
//! # Design Decisions
//! - One breaker per dependency, shared by all of its callers
//! - Fail fast in Open state (no waiting for timeout)
//! - Single trial in Half-Open; concurrent callers are rejected, not queued
//! - All transitions run under one mutex per breaker, never held across `.await`
//! - Permits carry the generation they were granted in; once the breaker has
//!   left Closed only the current trial permit can move it

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::CallError;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Gauge encoding: 0=closed, 1=open, 2=half-open.
    pub fn gauge_value(self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::Open => 1.0,
            CircuitState::HalfOpen => 2.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub opened_at: Option<Instant>,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
    /// Bumped on every transition to Open.
    generation: u64,
}

/// Per-dependency circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    reset_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a closed breaker. A threshold of 0 is treated as 1.
    pub fn new(name: impl Into<String>, failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                opened_at: None,
                trial_in_flight: false,
                generation: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn reset_timeout(&self) -> Duration {
        self.reset_timeout
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask permission to call the dependency.
    ///
    /// The returned permit should be settled with the call outcome. Dropping an
    /// unsettled half-open trial permit frees the trial slot.
    ///
    /// # Errors
    /// `CallError::CircuitOpen` if the breaker is open and the reset timeout has
    /// not elapsed, or a half-open trial is already in flight.
    pub fn allow(&self) -> Result<CallPermit<'_>, CallError> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Ok(CallPermit::new(self, false, inner.generation)),
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    Err(self.rejection())
                } else {
                    inner.trial_in_flight = true;
                    Ok(CallPermit::new(self, true, inner.generation))
                }
            }
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| Instant::now().saturating_duration_since(at))
                    .unwrap_or(self.reset_timeout);
                if elapsed >= self.reset_timeout {
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_in_flight = true;
                    tracing::info!(dependency = %self.name, "Circuit half-open, admitting trial call");
                    Ok(CallPermit::new(self, true, inner.generation))
                } else {
                    Err(self.rejection())
                }
            }
        }
    }

    /// Report a successful call.
    ///
    /// Unlike [`CallPermit::record_success`], this is not tied to a permit and
    /// always applies.
    pub fn on_success(&self) {
        self.apply_success(&mut self.lock());
    }

    /// Report a failed call.
    pub fn on_failure(&self) {
        self.apply_failure(&mut self.lock());
    }

    fn apply_success(&self, inner: &mut BreakerInner) {
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.failure_count = 0;
                inner.opened_at = None;
                inner.trial_in_flight = false;
                tracing::info!(dependency = %self.name, "Circuit closed after successful trial");
            }
            CircuitState::Closed => inner.failure_count = 0,
            // Late result from a call admitted before the trip.
            CircuitState::Open => {}
        }
    }

    fn apply_failure(&self, inner: &mut BreakerInner) {
        inner.failure_count = inner.failure_count.saturating_add(1);
        match inner.state {
            CircuitState::Closed if inner.failure_count >= self.failure_threshold => {
                self.open(inner);
                tracing::warn!(
                    dependency = %self.name,
                    failures = inner.failure_count,
                    reset_timeout = ?self.reset_timeout,
                    "Circuit opened"
                );
            }
            CircuitState::HalfOpen => {
                self.open(inner);
                tracing::warn!(dependency = %self.name, "Trial call failed, circuit reopened");
            }
            _ => {}
        }
    }

    fn open(&self, inner: &mut BreakerInner) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.trial_in_flight = false;
        inner.generation = inner.generation.wrapping_add(1);
    }

    /// Apply a permit's outcome if the permit still speaks for the breaker.
    ///
    /// In Closed every permit counts. In HalfOpen only the outstanding trial
    /// of the current generation counts. In Open nothing does.
    fn settle(&self, permit: &CallPermit<'_>, success: bool) {
        let mut inner = self.lock();
        let current = match inner.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                permit.trial && inner.trial_in_flight && permit.generation == inner.generation
            }
            CircuitState::Open => false,
        };
        if !current {
            tracing::debug!(
                dependency = %self.name,
                state = %inner.state,
                success,
                "Ignoring late result from an earlier breaker phase"
            );
            return;
        }
        if success {
            self.apply_success(&mut inner);
        } else {
            self.apply_failure(&mut inner);
        }
    }

    /// Current state.
    pub fn current_state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            failure_count: inner.failure_count,
            opened_at: inner.opened_at,
        }
    }

    fn abandon_trial(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen && inner.trial_in_flight && inner.generation == generation {
            inner.trial_in_flight = false;
            tracing::debug!(dependency = %self.name, "Trial call abandoned, slot released");
        }
    }

    fn rejection(&self) -> CallError {
        CallError::CircuitOpen {
            dependency: self.name.clone(),
        }
    }
}

/// Permission to make one call, granted by [`CircuitBreaker::allow`].
#[must_use = "settle the permit with record_success or record_failure"]
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    generation: u64,
    settled: bool,
}

impl<'a> CallPermit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool, generation: u64) -> Self {
        Self {
            breaker,
            trial,
            generation,
            settled: false,
        }
    }

    /// True if this call is the half-open trial.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn record_success(mut self) {
        self.settled = true;
        self.breaker.settle(&self, true);
    }

    pub fn record_failure(mut self) {
        self.settled = true;
        self.breaker.settle(&self, false);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.breaker.abandon_trial(self.generation);
        }
    }
}
