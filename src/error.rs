//! Error taxonomy for failover execution.

use std::time::Duration;
use thiserror::Error;

/// Boxed error returned by caller-supplied operations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the load balancer, circuit breaker and orchestrator.
#[derive(Debug, Error)]
pub enum FailoverError {
    /// No endpoint is both active and healthy.
    #[error("no healthy endpoint available")]
    NoEndpointAvailable,

    /// The circuit breaker rejected the call without invoking the operation.
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// The operation did not complete before the per-call deadline.
    #[error("operation timed out after {0:?}")]
    OperationTimeout(Duration),

    /// The operation returned its own error.
    #[error("operation failed: {0}")]
    OperationFailed(#[source] BoxError),

    /// Every orchestrator attempt failed.
    #[error("all {attempts} attempts failed{}", display_last(.last))]
    AllRetriesExhausted {
        attempts: u32,
        #[source]
        last: Option<Box<FailoverError>>,
    },
}

fn display_last(last: &Option<Box<FailoverError>>) -> String {
    match last {
        Some(err) => format!(": {}", err),
        None => String::new(),
    }
}

impl FailoverError {
    /// The most recent underlying error when retries were exhausted.
    pub fn last_error(&self) -> Option<&FailoverError> {
        match self {
            FailoverError::AllRetriesExhausted { last, .. } => last.as_deref(),
            _ => None,
        }
    }

    /// Whether the error was produced by a failing or slow operation
    /// (as opposed to a routing or breaker rejection).
    pub fn is_operation_error(&self) -> bool {
        matches!(
            self,
            FailoverError::OperationFailed(_) | FailoverError::OperationTimeout(_)
        )
    }
}
