//! Fallback subsystem.
//!
//! # Data Flow
//! ```text
//! FallbackChain::invoke()
//!     → ServiceInvoker[0].call()  (breaker → retry → remote → metrics)
//!     → on failure: ServiceInvoker[1].call(), ...
//!     → first success: ChainOutcome::Served
//!     → all failed:    ChainOutcome::Degraded(ChainExhausted)
//! ```
//!
//! # Design Decisions
//! - Priority is list order, fixed at construction
//! - Failures are matched by variant, never swallowed from metrics
//! - Total failure is a normal value so callers cannot forget to handle it

pub mod chain;
pub mod invoker;

pub use chain::{ChainExhausted, ChainOutcome, DependencyFailure, FallbackChain};
pub use invoker::ServiceInvoker;
