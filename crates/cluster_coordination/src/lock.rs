//! Cluster-wide named locks and the acquire / run / release sequence.

use crate::error::{CoordinationError, LockError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A named lock shared by every node of the cluster.
#[async_trait]
pub trait ClusterLock: Send + Sync + Debug {
    /// Fully qualified name, `<namespace>:<name>`.
    fn name(&self) -> &str;

    async fn acquire(&self) -> std::result::Result<(), LockError>;

    async fn release(&self) -> std::result::Result<(), LockError>;

    /// Frees backend resources held by this handle. Always runs last.
    async fn cleanup(&self) -> std::result::Result<(), LockError> {
        Ok(())
    }
}

/// Hands out lock handles scoped to a namespace.
pub trait LockProvider: Send + Sync + Debug {
    fn namespace(&self) -> &str;

    /// Returns a handle for `name` inside this provider's namespace.
    fn get_lock(&self, name: &str) -> Arc<dyn ClusterLock>;
}

/// Joins a namespace and a lock name.
pub fn namespaced(namespace: &str, name: &str) -> String {
    format!("{namespace}:{name}")
}

/// One observable step of a locked run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome {
    Acquired,
    AcquisitionFailed(LockError),
    Released,
    ReleaseFailed(LockError),
}

/// Which error wins when both the operation and the release fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePrecedence {
    /// Report the release failure; the operation error is kept as suppressed
    #[default]
    ReleaseFailure,
    /// Report the operation failure and log the release failure
    OperationFailure,
}

/// Runs `operation` while holding `lock`.
///
/// The sequence is acquire, operation, release, cleanup. The operation never
/// runs when acquisition fails. Cleanup runs whatever happened before it.
pub async fn with_lock<F, Fut, T>(
    lock: &dyn ClusterLock,
    precedence: FailurePrecedence,
    operation: F,
) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let (result, _) = with_lock_outcomes(lock, precedence, operation).await;
    result
}

/// Like [`with_lock`], also returning the lock outcomes in the order they happened.
pub async fn with_lock_outcomes<F, Fut, T>(
    lock: &dyn ClusterLock,
    precedence: FailurePrecedence,
    operation: F,
) -> (Result<T>, Vec<LockOutcome>)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let name = lock.name().to_string();
    let mut outcomes = Vec::with_capacity(2);

    if let Err(e) = lock.acquire().await {
        error!("❌ Failed to acquire lock '{}': {}", name, e);
        outcomes.push(LockOutcome::AcquisitionFailed(e.clone()));
        cleanup(lock).await;
        return (
            Err(CoordinationError::LockAcquisitionFailed { name, source: e }),
            outcomes,
        );
    }
    info!("🔐 Acquired lock '{}'", name);
    outcomes.push(LockOutcome::Acquired);

    let result = operation().await;

    let released = lock.release().await;
    match &released {
        Ok(()) => {
            debug!("Released lock '{}'", name);
            outcomes.push(LockOutcome::Released);
        }
        Err(e) => {
            error!("❌ Failed to release lock '{}': {}", name, e);
            outcomes.push(LockOutcome::ReleaseFailed(e.clone()));
        }
    }
    cleanup(lock).await;

    let result = match (result, released) {
        (result, Ok(())) => result,
        (Ok(_), Err(e)) => Err(CoordinationError::LockReleaseFailed {
            name,
            source: e,
            suppressed: None,
        }),
        (Err(op), Err(e)) => match precedence {
            FailurePrecedence::ReleaseFailure => Err(CoordinationError::LockReleaseFailed {
                name,
                source: e,
                suppressed: Some(Box::new(op)),
            }),
            FailurePrecedence::OperationFailure => {
                warn!("Release failure of '{}' suppressed by operation failure", name);
                Err(op)
            }
        },
    };

    (result, outcomes)
}

async fn cleanup(lock: &dyn ClusterLock) {
    if let Err(e) = lock.cleanup().await {
        warn!("⚠️ Cleanup of lock '{}' failed: {}", lock.name(), e);
    }
}
