//! Resilient call to a single dependency.
//!
//! # Data Flow
//! ```text
//! call()
//!     → breaker.allow()            (rejection: no timer, no remote call)
//!     → start timer
//!     → retry.execute(remote.call)
//!     → breaker.on_success / on_failure
//!     → outcome counter + latency histogram
//!     → circuit-state gauge         (every exit path, rejection included)
//! ```
//!
//! A call dropped after the timer started (shutdown, caller timeout) counts
//! as a failure outcome with the latency observed so far. Its permit is
//! released without touching the breaker.

use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;

use crate::dependency::{Payload, RemoteCall};
use crate::error::{CallError, CallResult};
use crate::observability::{MetricsRecorder, Outcome};
use crate::resilience::{CircuitBreaker, CircuitState, RetryPolicy};

/// `Breaker ∘ Retry ∘ RemoteCall` for one dependency, plus its instrumentation.
pub struct ServiceInvoker {
    name: String,
    breaker: CircuitBreaker,
    retry: Arc<RetryPolicy>,
    remote: Arc<dyn RemoteCall>,
    metrics: MetricsRecorder,
}

impl ServiceInvoker {
    /// Build an invoker. The breaker is owned; policy and remote are shared.
    pub fn new(
        name: impl Into<String>,
        breaker: CircuitBreaker,
        retry: Arc<RetryPolicy>,
        remote: Arc<dyn RemoteCall>,
        metrics: MetricsRecorder,
    ) -> Self {
        Self {
            name: name.into(),
            breaker,
            retry,
            remote,
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.current_state()
    }

    /// Call the dependency through its breaker and retry policy.
    ///
    /// # Errors
    /// `CircuitOpen` if the breaker refused the call, `RetryExhausted` if a
    /// transient failure outlived every attempt, or the permanent failure.
    pub async fn call(&self) -> CallResult<Payload> {
        let mut guard = CallGuard {
            invoker: self,
            started: None,
        };

        let permit = match self.breaker.allow() {
            Ok(permit) => permit,
            Err(rejection) => {
                tracing::debug!(dependency = %self.name, "Circuit open, call rejected");
                self.metrics.record_rejection(&self.name);
                return Err(rejection);
            }
        };

        let remote = &self.remote;
        let start = Instant::now();
        guard.started = Some(start);
        let result = self.retry.execute(move || remote.call()).await;
        guard.started = None;
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => {
                permit.record_success();
                self.metrics.record_outcome(&self.name, Outcome::Success);
            }
            Err(e) => {
                permit.record_failure();
                self.metrics.record_outcome(&self.name, Outcome::Failure);
                tracing::warn!(
                    dependency = %self.name,
                    error = %e,
                    state = %self.breaker.current_state(),
                    "Call failed"
                );
            }
        }
        self.metrics.record_latency(&self.name, elapsed);

        result
    }
}

impl fmt::Debug for ServiceInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceInvoker")
            .field("name", &self.name)
            .field("breaker", &self.breaker.snapshot())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Publishes the post-call breaker state when dropped.
///
/// `started` is set while the remote call is in flight; dropping the guard in
/// that window records the cancelled call as a failure.
struct CallGuard<'a> {
    invoker: &'a ServiceInvoker,
    started: Option<Instant>,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        let inv = self.invoker;
        if let Some(start) = self.started.take() {
            tracing::debug!(dependency = %inv.name, "Call cancelled in flight");
            inv.metrics.record_outcome(&inv.name, Outcome::Failure);
            inv.metrics.record_latency(&inv.name, start.elapsed());
        }
        let state = inv.breaker.current_state();
        inv.metrics.record_circuit_state(&inv.name, Some(state));
    }
}
