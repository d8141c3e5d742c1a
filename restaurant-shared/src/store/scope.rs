/// Per-request cancellation scope
///
/// One `RequestScope` is created for every inbound request and handed to
/// every storage call issued while serving it. Each call is bounded by the
/// scope's per-operation timeout and aborts early once the scope is
/// released. Release happens through a drop guard, so it fires exactly once
/// whichever way the request future ends (response, error, client hang-up).
///
/// # Example
///
/// ```
/// use restaurant_shared::store::scope::RequestScope;
/// use std::time::Duration;
///
/// # async fn example() {
/// let scope = RequestScope::new(Duration::from_secs(100));
/// let _release = scope.release_on_drop();
///
/// let value = scope.run(async { Ok(42) }).await;
/// assert_eq!(value.unwrap(), 42);
/// # }
/// ```

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::{StoreError, StoreResult};

/// Default per-operation storage timeout (100 seconds)
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(100);

/// Cancellation token plus per-operation timeout for one request
#[derive(Debug, Clone)]
pub struct RequestScope {
    token: CancellationToken,
    operation_timeout: Duration,
}

impl RequestScope {
    pub fn new(operation_timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            operation_timeout,
        }
    }

    /// Returns the guard that releases this scope when dropped
    ///
    /// Hold it for exactly as long as the request is being served.
    pub fn release_on_drop(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    /// Whether the scope has been released
    pub fn is_released(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Runs one storage operation inside the scope
    ///
    /// # Errors
    ///
    /// - `StoreError::Cancelled` if the scope is (or becomes) released
    /// - `StoreError::Timeout` if the operation exceeds the per-operation timeout
    /// - whatever the operation itself returns
    pub async fn run<T, F>(&self, operation: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        if self.token.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(StoreError::Cancelled),
            result = tokio::time::timeout(self.operation_timeout, operation) => {
                result.map_err(|_| StoreError::Timeout(self.operation_timeout))?
            }
        }
    }
}

impl Default for RequestScope {
    fn default() -> Self {
        Self::new(DEFAULT_OPERATION_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_passes_result_through() {
        let scope = RequestScope::default();
        assert_eq!(scope.run(async { Ok("done") }).await.unwrap(), "done");

        let err = scope
            .run(async { Err::<(), _>(StoreError::Backend("boom".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out() {
        let scope = RequestScope::new(Duration::from_secs(100));

        let err = scope
            .run(async {
                tokio::time::sleep(Duration::from_secs(101)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Timeout(d) if d == Duration::from_secs(100)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_finishes_within_timeout() {
        let scope = RequestScope::new(Duration::from_secs(100));

        let value = scope
            .run(async {
                tokio::time::sleep(Duration::from_secs(99)).await;
                Ok(7)
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_released_scope_rejects_operations() {
        let scope = RequestScope::default();
        {
            let _release = scope.release_on_drop();
            assert!(!scope.is_released());
        }
        assert!(scope.is_released());

        let err = scope.run(async { Ok(()) }).await.unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_interrupts_in_flight_operation() {
        let scope = RequestScope::default();
        let release = scope.release_on_drop();

        let in_flight = scope.clone();
        let handle = tokio::spawn(async move {
            in_flight
                .run(async {
                    tokio::time::sleep(Duration::from_secs(50)).await;
                    Ok(())
                })
                .await
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(release);

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
    }
}
