//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap remote calls with a deadline
//! - Map an elapsed deadline to a transient failure
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry
//! - Timeouts are retryable, like connection errors

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::error::CallError;

/// Run `fut` with a deadline, mapping expiry to `CallError::Transient`.
///
/// # Errors
/// The inner error, or a transient timeout failure if `limit` elapses first.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, CallError>
where
    F: Future<Output = Result<T, CallError>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(CallError::timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_maps_to_transient() {
        let result: Result<(), _> = with_timeout(Duration::from_secs(3), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err, CallError::timeout(Duration::from_secs(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inner_result_passes_through() {
        let ok = with_timeout(Duration::from_secs(1), async { Ok::<_, CallError>(1) }).await;
        assert_eq!(ok, Ok(1));

        let err: Result<(), _> = with_timeout(Duration::from_secs(1), async {
            Err(CallError::Permanent("HTTP 400".into()))
        })
        .await;
        assert_eq!(err, Err(CallError::Permanent("HTTP 400".into())));
    }
}
