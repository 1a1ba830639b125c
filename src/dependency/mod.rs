//! Remote dependency boundary.
//!
//! # Data Flow
//! ```text
//! ServiceInvoker
//!     → RemoteCall::call() (one request, deadline enforced by the implementation)
//!     → Ok(Payload) or CallError::{Transient, Permanent}
//! ```
//!
//! # Design Decisions
//! - One trait object per dependency, shared via `Arc` and never copied
//! - Implementations classify failures; the retry policy only reads the class
//! - `http.rs` is the production implementation; `from_fn` adapts closures

pub mod http;

use async_trait::async_trait;
use std::future::Future;

use crate::error::CallResult;

pub use http::HttpDependency;

/// Body returned by a healthy dependency.
pub type Payload = serde_json::Value;

/// A single request operation against one downstream dependency.
#[async_trait]
pub trait RemoteCall: Send + Sync {
    async fn call(&self) -> CallResult<Payload>;
}

/// [`RemoteCall`] backed by an async closure.
pub struct FnCall<F> {
    f: F,
}

/// Wrap an async closure as a [`RemoteCall`].
pub fn from_fn<F, Fut>(f: F) -> FnCall<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = CallResult<Payload>> + Send + 'static,
{
    FnCall { f }
}

#[async_trait]
impl<F, Fut> RemoteCall for FnCall<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = CallResult<Payload>> + Send + 'static,
{
    async fn call(&self) -> CallResult<Payload> {
        (self.f)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CallError;
    use serde_json::json;

    #[tokio::test]
    async fn test_from_fn_forwards_result() {
        let ok = from_fn(|| async { Ok(json!({"source": "A"})) });
        assert_eq!(ok.call().await, Ok(json!({"source": "A"})));

        let failing = from_fn(|| async { Err(CallError::Transient("HTTP 500".into())) });
        assert!(failing.call().await.unwrap_err().is_transient());
    }
}
