//! Resilient client for unreliable remote dependencies.
//!
//! Per-dependency circuit breakers, bounded fixed-delay retries and an ordered
//! fallback chain, instrumented with Prometheus metrics.

pub mod bootstrap;
pub mod config;
pub mod dependency;
pub mod driver;
pub mod error;
pub mod fallback;
pub mod observability;
pub mod resilience;

pub use config::ClientConfig;
pub use error::CallError;
pub use fallback::{ChainOutcome, FallbackChain, ServiceInvoker};
