//! In-process lock provider for single-node deployments and tests.

use crate::error::LockError;
use crate::lock::{namespaced, ClusterLock, LockProvider};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;
use uuid::Uuid;

/// Lock provider backed by one semaphore per fully qualified lock name.
///
/// Handles for the same name share the semaphore, so they exclude each other
/// exactly as handles from different nodes would with a distributed backend.
#[derive(Debug)]
pub struct LocalLockProvider {
    namespace: String,
    acquire_timeout: Duration,
    locks: DashMap<String, Arc<Semaphore>>,
}

impl LocalLockProvider {
    pub fn new(namespace: impl Into<String>, acquire_timeout: Duration) -> Self {
        Self {
            namespace: namespace.into(),
            acquire_timeout,
            locks: DashMap::new(),
        }
    }

    /// Number of distinct lock names handed out so far.
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }
}

impl LockProvider for LocalLockProvider {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn get_lock(&self, name: &str) -> Arc<dyn ClusterLock> {
        let full_name = namespaced(&self.namespace, name);
        let semaphore = self
            .locks
            .entry(full_name.clone())
            .or_insert_with(|| Arc::new(Semaphore::new(1)))
            .clone();

        Arc::new(LocalLock {
            name: full_name,
            owner: Uuid::new_v4(),
            semaphore,
            timeout: self.acquire_timeout,
            held: Mutex::new(None),
        })
    }
}

#[derive(Debug)]
struct LocalLock {
    name: String,
    owner: Uuid,
    semaphore: Arc<Semaphore>,
    timeout: Duration,
    held: Mutex<Option<OwnedSemaphorePermit>>,
}

impl LocalLock {
    fn held(&self) -> std::sync::MutexGuard<'_, Option<OwnedSemaphorePermit>> {
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ClusterLock for LocalLock {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire(&self) -> Result<(), LockError> {
        let permit = tokio::time::timeout(self.timeout, self.semaphore.clone().acquire_owned())
            .await
            .map_err(|_| LockError::Timeout {
                name: self.name.clone(),
                timeout: self.timeout,
            })?
            .map_err(|e| LockError::backend(&self.name, e.to_string()))?;

        debug!("Lock '{}' taken by {}", self.name, self.owner);
        *self.held() = Some(permit);
        Ok(())
    }

    async fn release(&self) -> Result<(), LockError> {
        match self.held().take() {
            Some(permit) => {
                drop(permit);
                debug!("Lock '{}' given up by {}", self.name, self.owner);
                Ok(())
            }
            None => Err(LockError::NotHeld {
                name: self.name.clone(),
            }),
        }
    }

    async fn cleanup(&self) -> Result<(), LockError> {
        // A permit still held here belongs to an abandoned run.
        self.held().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_names_are_namespaced() {
        let provider = LocalLockProvider::new("bastion", Duration::from_millis(50));
        let lock = provider.get_lock("upgrade");
        assert_eq!(lock.name(), "bastion:upgrade");
        assert_eq!(provider.namespace(), "bastion");
    }

    #[tokio::test]
    async fn test_second_handle_times_out_while_held() {
        let provider = LocalLockProvider::new("bastion", Duration::from_millis(50));
        let first = provider.get_lock("upgrade");
        let second = provider.get_lock("upgrade");
        assert_eq!(provider.lock_count(), 1);

        first.acquire().await.unwrap();
        let err = second.acquire().await.unwrap_err();
        assert!(err.is_timeout());

        first.release().await.unwrap();
        second.acquire().await.unwrap();
        second.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_different_names_do_not_contend() {
        let provider = LocalLockProvider::new("bastion", Duration::from_millis(50));
        let upgrade = provider.get_lock("upgrade");
        let reindex = provider.get_lock("reindex");

        upgrade.acquire().await.unwrap();
        reindex.acquire().await.unwrap();
        assert_eq!(provider.lock_count(), 2);
    }

    #[tokio::test]
    async fn test_release_without_acquire_fails() {
        let provider = LocalLockProvider::new("bastion", Duration::from_millis(50));
        let lock = provider.get_lock("upgrade");
        assert!(matches!(
            lock.release().await,
            Err(LockError::NotHeld { .. })
        ));
    }
}
