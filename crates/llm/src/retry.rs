//! Retry decorator for connection-level failures.
//!
//! Only `Unreachable` errors are retried, a fixed number of times with a fixed
//! backoff. Timeouts are never retried: generation latency already dominates
//! and a second attempt would double it.

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use crate::error::ProviderResult;
use std::sync::Arc;
use std::time::Duration;

/// Retry settings for transient connection failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Wraps any client and retries connection failures according to a policy.
pub struct RetryingClient {
    inner: Arc<dyn LlmClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn LlmClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl LlmClient for RetryingClient {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    async fn complete(&self, request: &LlmRequest) -> ProviderResult<LlmResponse> {
        let mut attempt = 0;

        loop {
            match self.inner.complete(request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_connection_failure() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        provider = self.inner.provider_name(),
                        "Connection failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        self.policy.max_retries + 1,
                        self.policy.backoff.as_millis(),
                        err
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmUsage;
    use crate::error::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with the given error a fixed number of times, then succeeds.
    struct FlakyClient {
        failures: u32,
        error: ProviderError,
        calls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl LlmClient for FlakyClient {
        fn provider_name(&self) -> &str {
            "flaky"
        }

        async fn complete(&self, request: &LlmRequest) -> ProviderResult<LlmResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(self.error.clone());
            }
            Ok(LlmResponse {
                content: "ok".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
                done: true,
            })
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            backoff: Duration::ZERO,
        }
    }

    fn flaky(failures: u32, error: ProviderError) -> Arc<FlakyClient> {
        Arc::new(FlakyClient {
            failures,
            error,
            calls: AtomicU32::new(0),
        })
    }

    #[tokio::test]
    async fn test_retries_connection_failures() {
        let inner = flaky(2, ProviderError::Unreachable("refused".into()));
        let client = RetryingClient::new(inner.clone(), policy());

        let response = client.complete(&LlmRequest::new("q", "m")).await.unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let inner = flaky(5, ProviderError::Unreachable("refused".into()));
        let client = RetryingClient::new(inner.clone(), policy());

        let err = client.complete(&LlmRequest::new("q", "m")).await.unwrap_err();
        assert_eq!(err.kind(), "unreachable");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_never_retries_timeout() {
        let inner = flaky(1, ProviderError::Timeout("slow".into()));
        let client = RetryingClient::new(inner.clone(), policy());

        let err = client.complete(&LlmRequest::new("q", "m")).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported_not_retried() {
        let inner = flaky(1, ProviderError::RateLimited("429".into()));
        let client = RetryingClient::new(inner.clone(), policy());

        let err = client.complete(&LlmRequest::new("q", "m")).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }
}
