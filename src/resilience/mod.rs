//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a dependency:
//!     → circuit_breaker.rs (fail fast if the dependency is tripped)
//!     → retries.rs (re-run transient failures with a fixed delay)
//!     → timeouts.rs (every remote attempt has a deadline)
//!     → breaker observes only the post-retry outcome
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Breaker wraps retry, never the reverse
//! - Circuit breaker prevents cascading failures

pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{BreakerSnapshot, CallPermit, CircuitBreaker, CircuitState};
pub use retries::RetryPolicy;
