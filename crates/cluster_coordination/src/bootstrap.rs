use crate::error::Result;
use crate::lock::{with_lock, FailurePrecedence, LockProvider};
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Lock name used for bootstrap work such as schema migration.
pub const BOOTSTRAP_LOCK_NAME: &str = "bootstrap";

/// Serializes one-time startup work across every node of the cluster.
///
/// Each node runs its bootstrap operation under the same lock, so the first
/// node to get there does the work and later nodes see it already done.
#[derive(Debug, Clone)]
pub struct BootstrapLock {
    provider: Arc<dyn LockProvider>,
    precedence: FailurePrecedence,
}

impl BootstrapLock {
    pub fn new(provider: Arc<dyn LockProvider>, precedence: FailurePrecedence) -> Self {
        Self { provider, precedence }
    }

    pub async fn run_once<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let lock = self.provider.get_lock(BOOTSTRAP_LOCK_NAME);
        info!("🚀 Running bootstrap under lock '{}'", lock.name());
        with_lock(lock.as_ref(), self.precedence, operation).await
    }
}
