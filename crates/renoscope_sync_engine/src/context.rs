//! Per-call state shared by the push and pull phases.

use crate::config::RetryConfig;
use crate::error::{SyncError, SyncResult};
use crate::remote::{ApiResponse, Method, RemoteClient};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

/// What a sync phase needs from the engine.
pub(crate) struct SyncContext<'a> {
    remote: &'a dyn RemoteClient,
    cancelled: &'a AtomicBool,
}

impl<'a> SyncContext<'a> {
    pub(crate) fn new(remote: &'a dyn RemoteClient, cancelled: &'a AtomicBool) -> Self {
        Self { remote, cancelled }
    }

    /// Fails with [`SyncError::Cancelled`] once the engine was asked to stop.
    pub(crate) fn check_cancelled(&self) -> SyncResult<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sends a request and returns the payload of the successful response.
    ///
    /// Retryable failures are retried with backoff up to `retry.max_attempts`
    /// attempts in total. Cancellation is checked before every retry.
    pub(crate) fn send(
        &self,
        retry: &RetryConfig,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> SyncResult<Option<Value>> {
        let mut attempt = 0u32;
        loop {
            let outcome = self
                .remote
                .send(method, path, body)
                .and_then(ApiResponse::into_data);

            match outcome {
                Ok(data) => return Ok(data),
                Err(err) if err.is_retryable() && attempt + 1 < retry.max_attempts => {
                    attempt += 1;
                    let delay = retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        %method,
                        path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "request failed, retrying"
                    );
                    self.check_cancelled()?;
                    std::thread::sleep(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockFailure, MockRemote};
    use std::time::Duration;

    fn fast_retry(attempts: u32) -> RetryConfig {
        RetryConfig::new(attempts)
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false)
    }

    #[test]
    fn retries_transient_failures() {
        let remote = MockRemote::new();
        remote.fail_times(Method::Get, "/api/media", 2, MockFailure::status(503, "busy"));
        let cancelled = AtomicBool::new(false);
        let ctx = SyncContext::new(&remote, &cancelled);

        let data = ctx.send(&fast_retry(3), Method::Get, "/api/media", None).unwrap();
        assert_eq!(data, Some(Value::Array(Vec::new())));
        assert_eq!(remote.request_count(), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let remote = MockRemote::new();
        remote.fail_always(Method::Get, "/api/media", MockFailure::transport("reset"));
        let cancelled = AtomicBool::new(false);
        let ctx = SyncContext::new(&remote, &cancelled);

        let err = ctx.send(&fast_retry(2), Method::Get, "/api/media", None).unwrap_err();
        assert!(matches!(err, SyncError::Transport { .. }));
        assert_eq!(remote.request_count(), 2);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let remote = MockRemote::new();
        remote.fail_always(Method::Get, "/api/media", MockFailure::status(403, "forbidden"));
        let cancelled = AtomicBool::new(false);
        let ctx = SyncContext::new(&remote, &cancelled);

        let err = ctx.send(&fast_retry(5), Method::Get, "/api/media", None).unwrap_err();
        assert!(matches!(err, SyncError::Api { status: 403, .. }));
        assert_eq!(remote.request_count(), 1);
    }

    #[test]
    fn cancellation_stops_retries() {
        let remote = MockRemote::new();
        remote.fail_always(Method::Get, "/api/media", MockFailure::status(500, "boom"));
        let cancelled = AtomicBool::new(true);
        let ctx = SyncContext::new(&remote, &cancelled);

        let err = ctx.send(&fast_retry(5), Method::Get, "/api/media", None).unwrap_err();
        assert!(matches!(err, SyncError::Cancelled));
        assert_eq!(remote.request_count(), 1);
    }
}
