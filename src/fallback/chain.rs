//! Ordered fallback across dependencies.

use serde_json::json;
use std::fmt;

use crate::dependency::Payload;
use crate::error::CallError;
use crate::fallback::invoker::ServiceInvoker;

/// Payload surfaced when every dependency failed.
pub const DEGRADED_MESSAGE: &str = "All dependencies are down";

/// One dependency's failure inside a [`ChainExhausted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyFailure {
    pub dependency: String,
    pub error: CallError,
}

/// Every invoker in the chain failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainExhausted {
    pub failures: Vec<DependencyFailure>,
}

impl fmt::Display for ChainExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all {} dependencies failed", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{} ({})", sep, failure.dependency, failure.error)?;
        }
        Ok(())
    }
}

/// Result of a chain invocation. Total failure is a value, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainOutcome {
    Served { dependency: String, payload: Payload },
    Degraded(ChainExhausted),
}

impl ChainOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ChainOutcome::Degraded(_))
    }

    /// Name of the dependency that answered, if any.
    pub fn served_by(&self) -> Option<&str> {
        match self {
            ChainOutcome::Served { dependency, .. } => Some(dependency),
            ChainOutcome::Degraded(_) => None,
        }
    }

    /// The served payload, or `{"error": DEGRADED_MESSAGE}`.
    pub fn into_payload(self) -> Payload {
        match self {
            ChainOutcome::Served { payload, .. } => payload,
            ChainOutcome::Degraded(_) => json!({ "error": DEGRADED_MESSAGE }),
        }
    }
}

/// Invokers tried in priority order until one succeeds.
#[derive(Debug)]
pub struct FallbackChain {
    invokers: Vec<ServiceInvoker>,
}

impl FallbackChain {
    pub fn new(invokers: Vec<ServiceInvoker>) -> Self {
        Self { invokers }
    }

    pub fn invokers(&self) -> &[ServiceInvoker] {
        &self.invokers
    }

    /// Try each invoker once, in order.
    pub async fn invoke(&self) -> ChainOutcome {
        let mut failures = Vec::with_capacity(self.invokers.len());

        for invoker in &self.invokers {
            tracing::debug!(
                dependency = invoker.name(),
                state = %invoker.circuit_state(),
                "Trying dependency"
            );

            match invoker.call().await {
                Ok(payload) => {
                    if !failures.is_empty() {
                        tracing::info!(dependency = invoker.name(), skipped = failures.len(), "Served by fallback");
                    }
                    return ChainOutcome::Served {
                        dependency: invoker.name().to_string(),
                        payload,
                    };
                }
                Err(error) => {
                    match &error {
                        CallError::CircuitOpen { .. } => {
                            tracing::info!(dependency = invoker.name(), "Skipping dependency, circuit open");
                        }
                        CallError::RetryExhausted { attempts, last } => {
                            tracing::warn!(dependency = invoker.name(), attempts, error = %last, "Dependency exhausted retries");
                        }
                        CallError::Transient(_) | CallError::Permanent(_) => {
                            tracing::warn!(dependency = invoker.name(), error = %error, "Dependency failed");
                        }
                    }
                    failures.push(DependencyFailure {
                        dependency: invoker.name().to_string(),
                        error,
                    });
                }
            }
        }

        let exhausted = ChainExhausted { failures };
        tracing::error!(error = %exhausted, "Fallback chain exhausted");
        ChainOutcome::Degraded(exhausted)
    }
}
