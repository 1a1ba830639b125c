//! Composition root.
//!
//! Builds every breaker, the shared retry policy and the fallback chain from a
//! validated [`ClientConfig`]. Nothing here is global; the caller owns the chain.

use std::sync::Arc;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::dependency::HttpDependency;
use crate::fallback::{FallbackChain, ServiceInvoker};
use crate::observability::MetricsRecorder;
use crate::resilience::{CircuitBreaker, RetryPolicy};

/// Errors while wiring the client.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Build the fallback chain described by `config`.
///
/// # Errors
/// Returns `BootstrapError::HttpClient` if the shared HTTP client cannot be built.
pub fn build_chain(config: &ClientConfig, metrics: MetricsRecorder) -> Result<FallbackChain, BootstrapError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("failover-client/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let retry = Arc::new(RetryPolicy::from_config(&config.retry));

    let invokers = config
        .dependencies
        .iter()
        .map(|dep| {
            let breaker_config = dep.breaker.as_ref().unwrap_or(&config.breaker);
            let breaker = CircuitBreaker::new(
                &dep.name,
                breaker_config.failure_threshold,
                breaker_config.reset_timeout(),
            );
            tracing::info!(
                dependency = %dep.name,
                url = %dep.url,
                failure_threshold = breaker_config.failure_threshold,
                reset_timeout_secs = breaker_config.reset_timeout_secs,
                "Dependency registered"
            );
            let remote = Arc::new(HttpDependency::from_config(dep, client.clone()));
            ServiceInvoker::new(&dep.name, breaker, retry.clone(), remote, metrics.clone())
        })
        .collect();

    Ok(FallbackChain::new(invokers))
}
