//! Timeout enforcement.
//!
//! Wraps operations with a deadline. A timed-out future is dropped, so the
//! operation is abandoned rather than awaited past the deadline.

use std::future::Future;
use std::time::Duration;
use tokio::time;

use crate::error::{BoxError, FailoverError};

/// Run `fut` under `deadline`, mapping both the operation's own error and a
/// deadline overrun into [`FailoverError`].
pub async fn with_deadline<T, Fut>(deadline: Duration, fut: Fut) -> Result<T, FailoverError>
where
    Fut: Future<Output = Result<T, BoxError>>,
{
    match time::timeout(deadline, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(FailoverError::OperationFailed(e)),
        Err(_) => Err(FailoverError::OperationTimeout(deadline)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_overrun_is_timeout() {
        let result: Result<(), _> = with_deadline(Duration::from_millis(50), async {
            time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(FailoverError::OperationTimeout(d)) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_operation_error_passes_through() {
        let result: Result<(), _> =
            with_deadline(Duration::from_secs(1), async { Err::<(), BoxError>("refused".into()) }).await;
        match result {
            Err(FailoverError::OperationFailed(e)) => assert_eq!(e.to_string(), "refused"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
