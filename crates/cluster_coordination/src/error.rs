//! Error types for latching, draining and cluster locking.

use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the coordination crate.
pub type Result<T> = std::result::Result<T, CoordinationError>;

/// Failures reported by a cluster lock backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The lock could not be obtained before the acquire timeout
    #[error("Lock acquisition timeout for '{name}' after {timeout:?}")]
    Timeout { name: String, timeout: Duration },

    /// The caller tried to release a lock it does not hold
    #[error("Lock '{name}' is not held by this handle")]
    NotHeld { name: String },

    /// The backend could not be reached or rejected the request
    #[error("Lock backend error for '{name}': {message}")]
    Backend { name: String, message: String },
}

impl LockError {
    /// Create backend error
    pub fn backend(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Check if it is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, LockError::Timeout { .. })
    }
}

/// Errors surfaced by the coordination layer.
///
/// Drain, latch and lock failures share one type so maintenance callers deal
/// with a single error category while still matching on the exact cause.
#[derive(Error, Debug)]
pub enum CoordinationError {
    /// A latched service did not reach quiescence within the drain and
    /// force-drain timeouts. The service stays latched.
    #[error("Service '{service}' failed to drain (drain {drain_timeout:?}, force drain {force_drain_timeout:?})")]
    DrainFailed {
        service: String,
        drain_timeout: Duration,
        force_drain_timeout: Duration,
    },

    /// An operator cancelled the drain or the maintenance task
    #[error("Drain of '{service}' was cancelled")]
    Cancelled { service: String },

    /// Latch requested or released in the wrong state
    #[error("Illegal latch state on '{service}': {reason}")]
    IllegalLatchState { service: String, reason: String },

    #[error("Failed to acquire lock '{name}': {source}")]
    LockAcquisitionFailed {
        name: String,
        #[source]
        source: LockError,
    },

    /// Releasing the lock failed. When the protected operation failed too
    /// its error is kept in `suppressed`.
    #[error("Failed to release lock '{name}': {source}")]
    LockReleaseFailed {
        name: String,
        #[source]
        source: LockError,
        suppressed: Option<Box<CoordinationError>>,
    },

    /// The protected operation itself failed
    #[error("Operation failed: {0}")]
    OperationFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CoordinationError {
    /// Wraps an arbitrary operation error.
    pub fn operation<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::OperationFailed(error.into())
    }

    pub fn illegal_latch(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IllegalLatchState {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// True for failures of the lock itself rather than of drain or the operation.
    pub fn is_lock_error(&self) -> bool {
        matches!(
            self,
            CoordinationError::LockAcquisitionFailed { .. } | CoordinationError::LockReleaseFailed { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoordinationError::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_error_category() {
        let acquire = CoordinationError::LockAcquisitionFailed {
            name: "bastion:upgrade".to_string(),
            source: LockError::Timeout {
                name: "bastion:upgrade".to_string(),
                timeout: Duration::from_secs(5),
            },
        };
        assert!(acquire.is_lock_error());
        assert!(!CoordinationError::operation("disk full").is_lock_error());
        assert!(acquire.to_string().contains("bastion:upgrade"));
    }

    #[test]
    fn test_operation_error_message() {
        let err = CoordinationError::operation("disk full");
        assert_eq!(err.to_string(), "Operation failed: disk full");
    }
}
