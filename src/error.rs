//! Failure taxonomy shared by dependencies, resilience and the fallback chain.

use std::time::Duration;
use thiserror::Error;

/// Errors produced while calling a single dependency.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Timeout, connection failure or server-side error. Retryable.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Application error the dependency will keep returning. Not retried.
    #[error("permanent failure: {0}")]
    Permanent(String),

    /// A transient failure persisted through every allowed attempt.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: Box<CallError> },

    /// The breaker refused the call without attempting it.
    #[error("circuit open for {dependency}")]
    CircuitOpen { dependency: String },
}

impl CallError {
    /// Request deadline elapsed at the remote-call boundary.
    pub fn timeout(after: Duration) -> Self {
        CallError::Transient(format!("request timed out after {:?}", after))
    }

    /// Whether the default retry predicate should try again.
    pub fn is_transient(&self) -> bool {
        matches!(self, CallError::Transient(_))
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, CallError::CircuitOpen { .. })
    }

    /// Innermost failure, looking through `RetryExhausted`.
    pub fn root_cause(&self) -> &CallError {
        match self {
            CallError::RetryExhausted { last, .. } => last.root_cause(),
            other => other,
        }
    }
}

/// Result type for dependency calls.
pub type CallResult<T> = Result<T, CallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CallError::Transient("connection refused".into()).is_transient());
        assert!(CallError::timeout(Duration::from_secs(3)).is_transient());
        assert!(!CallError::Permanent("bad request".into()).is_transient());
        assert!(!CallError::CircuitOpen { dependency: "a".into() }.is_transient());
    }

    #[test]
    fn test_root_cause_unwraps_exhaustion() {
        let err = CallError::RetryExhausted {
            attempts: 2,
            last: Box::new(CallError::Transient("HTTP 500".into())),
        };
        assert_eq!(err.root_cause(), &CallError::Transient("HTTP 500".into()));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = CallError::RetryExhausted {
            attempts: 2,
            last: Box::new(CallError::timeout(Duration::from_secs(3))),
        };
        assert_eq!(
            err.to_string(),
            "retries exhausted after 2 attempts: transient failure: request timed out after 3s"
        );

        let err = CallError::CircuitOpen { dependency: "service_a".into() };
        assert_eq!(err.to_string(), "circuit open for service_a");
    }
}
