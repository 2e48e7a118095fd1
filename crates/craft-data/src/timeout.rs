//! Time bounds for remote steps.

use std::future::Future;
use std::time::Duration;

use crate::step::{RemoteStep, StepKind};

/// Time bounds applied to remote steps, by step class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Bound for reads.
    pub read: Duration,
    /// Bound for writes.
    pub write: Duration,
    /// Bound for auth provider calls.
    pub auth: Duration,
    /// Bound for email dispatch.
    pub email: Duration,
}

impl TimeoutConfig {
    /// Create a new timeout configuration.
    pub fn new(read: Duration, write: Duration, auth: Duration, email: Duration) -> Self {
        Self {
            read,
            write,
            auth,
            email,
        }
    }

    /// Use the same bound for every step.
    pub fn uniform(limit: Duration) -> Self {
        Self::new(limit, limit, limit, limit)
    }

    /// Build from millisecond values, as read from config files.
    pub fn from_millis(read: u64, write: u64, auth: u64, email: u64) -> Self {
        Self::new(
            Duration::from_millis(read),
            Duration::from_millis(write),
            Duration::from_millis(auth),
            Duration::from_millis(email),
        )
    }

    /// Get the bound for a step.
    pub fn for_step(&self, step: RemoteStep) -> Duration {
        match step.kind() {
            StepKind::Read => self.read,
            StepKind::Write => self.write,
            StepKind::Auth => self.auth,
            StepKind::Email => self.email,
        }
    }

    /// Run a step under its configured bound.
    pub async fn run<F, T, E>(&self, step: RemoteStep, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<TimeoutError>,
    {
        with_timeout(step, self.for_step(step), operation).await
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read: Duration::from_millis(3000),
            write: Duration::from_millis(3000),
            auth: Duration::from_millis(3000),
            email: Duration::from_millis(10_000),
        }
    }
}

/// Error when a remote step exceeds its bound.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{step} timed out after {limit:?}")]
pub struct TimeoutError {
    /// The step that timed out.
    pub step: RemoteStep,
    /// The bound that was exceeded.
    pub limit: Duration,
}

/// Bound a remote step by `limit`.
///
/// The operation is dropped when the bound is exceeded, which cancels it.
/// A timeout always surfaces as an error of the step, never as success.
pub async fn with_timeout<F, T, E>(step: RemoteStep, limit: Duration, operation: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<TimeoutError>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(step = %step, limit_ms = limit.as_millis() as u64, "remote step timed out");
            Err(TimeoutError { step, limit }.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Timeout(RemoteStep),
        Failed,
    }

    impl From<TimeoutError> for TestError {
        fn from(e: TimeoutError) -> Self {
            TestError::Timeout(e.step)
        }
    }

    #[test]
    fn test_default_bounds() {
        let config = TimeoutConfig::default();
        assert_eq!(config.for_step(RemoteStep::OrderInsert), Duration::from_secs(3));
        assert_eq!(config.for_step(RemoteStep::Regions), Duration::from_secs(3));
        assert_eq!(config.for_step(RemoteStep::Email), Duration::from_secs(10));
    }

    #[test]
    fn test_from_millis() {
        let config = TimeoutConfig::from_millis(100, 200, 300, 400);
        assert_eq!(config.for_step(RemoteStep::Catalog), Duration::from_millis(100));
        assert_eq!(config.for_step(RemoteStep::PromocodeUsage), Duration::from_millis(200));
        assert_eq!(config.for_step(RemoteStep::SignIn), Duration::from_millis(300));
        assert_eq!(config.for_step(RemoteStep::Email), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_within_bound() {
        let result: Result<u32, TestError> =
            with_timeout(RemoteStep::Catalog, Duration::from_secs(3), async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(7)
            })
            .await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_becomes_timeout() {
        let result: Result<u32, TestError> = with_timeout(
            RemoteStep::OrderInsert,
            Duration::from_secs(3),
            std::future::pending(),
        )
        .await;
        assert_eq!(result, Err(TestError::Timeout(RemoteStep::OrderInsert)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inner_error_passes_through() {
        let config = TimeoutConfig::uniform(Duration::from_millis(50));
        let result: Result<u32, TestError> = config
            .run(RemoteStep::Regions, async { Err(TestError::Failed) })
            .await;
        assert_eq!(result, Err(TestError::Failed));
    }

    #[test]
    fn test_timeout_error_message() {
        let err = TimeoutError {
            step: RemoteStep::SignOut,
            limit: Duration::from_millis(3000),
        };
        assert_eq!(err.to_string(), "sign_out timed out after 3s");
    }
}
