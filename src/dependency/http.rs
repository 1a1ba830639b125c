//! HTTP dependency client.
//!
//! # Responsibilities
//! - Fetch a JSON payload with GET
//! - Enforce the request deadline around connect, headers and body
//! - Classify failures as transient or permanent
//!
//! # Failure Classification
//! ```text
//! timeout, connection error, 5xx  → Transient (retryable)
//! other non-2xx, non-JSON body    → Permanent
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;

use crate::config::DependencyConfig;
use crate::dependency::{Payload, RemoteCall};
use crate::error::{CallError, CallResult};
use crate::resilience::timeouts::with_timeout;

/// A dependency reached with `GET <url>`.
#[derive(Clone)]
pub struct HttpDependency {
    name: String,
    url: String,
    client: Client,
    timeout: Duration,
}

impl HttpDependency {
    pub fn new(name: impl Into<String>, url: impl Into<String>, timeout: Duration, client: Client) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client,
            timeout,
        }
    }

    pub fn from_config(config: &DependencyConfig, client: Client) -> Self {
        Self::new(&config.name, &config.url, config.timeout(), client)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> CallResult<Payload> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if let Some(err) = classify_status(status) {
            return Err(err);
        }

        response
            .json::<Payload>()
            .await
            .map_err(|e| match classify_transport(e) {
                CallError::Transient(reason) => CallError::Transient(reason),
                _ => CallError::Permanent("malformed payload".to_string()),
            })
    }
}

#[async_trait]
impl RemoteCall for HttpDependency {
    async fn call(&self) -> CallResult<Payload> {
        tracing::debug!(dependency = %self.name, url = %self.url, "Calling dependency");
        let result = with_timeout(self.timeout, self.fetch()).await;
        if let Err(e) = &result {
            tracing::warn!(dependency = %self.name, error = %e, "Dependency call failed");
        }
        result
    }
}

impl fmt::Debug for HttpDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpDependency")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Map a response status to a failure, or `None` for success.
pub fn classify_status(status: StatusCode) -> Option<CallError> {
    if status.is_success() {
        None
    } else if status.is_server_error() {
        Some(CallError::Transient(format!("HTTP {}", status)))
    } else {
        Some(CallError::Permanent(format!("HTTP {}", status)))
    }
}

fn classify_transport(e: reqwest::Error) -> CallError {
    if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
        CallError::Transient(e.to_string())
    } else {
        CallError::Permanent(e.to_string())
    }
}
