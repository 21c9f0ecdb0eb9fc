//! Latch contracts: a latched service restricts new work and can be drained
//! until in-flight work reaches zero.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Which new work a latched service refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatchMode {
    /// Reads continue, writes are refused
    RejectWrites,
    /// Nothing new is admitted
    RejectAll,
}

/// Outcome of a single drain or force-drain wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Outstanding work reached zero
    Drained,
    /// The timeout elapsed with work still outstanding
    TimedOut,
    /// The wait was interrupted through its cancellation token
    Cancelled,
}

impl DrainStatus {
    pub fn is_drained(&self) -> bool {
        matches!(self, DrainStatus::Drained)
    }
}

/// A restriction held on a service for the length of a maintenance run.
#[async_trait]
pub trait Latch: Send + Sync + Debug {
    fn mode(&self) -> LatchMode;

    /// Waits up to `timeout` for outstanding work to finish on its own.
    ///
    /// A zero timeout checks once without waiting.
    async fn drain(&self, timeout: Duration, cancel: &CancellationToken) -> DrainStatus;

    /// Signals in-flight work to abort, then waits up to `timeout` for it to
    /// finish.
    async fn force_drain(&self, timeout: Duration, cancel: &CancellationToken) -> DrainStatus;

    /// Whether the last drain or force drain succeeded.
    fn is_drained(&self) -> bool;
}

/// A service that can be latched for maintenance.
pub trait LatchableService: Send + Sync {
    fn service_name(&self) -> &str;

    /// Places the service in `mode`. Fails if it is already latched.
    fn acquire_latch(&self, mode: LatchMode) -> Result<Arc<dyn Latch>>;

    /// The latch currently held, if any.
    fn current_latch(&self) -> Option<Arc<dyn Latch>>;

    /// Lifts the restriction. Fails if the service is not latched.
    fn unlatch(&self) -> Result<()>;

    fn is_latched(&self) -> bool {
        self.current_latch().is_some()
    }
}
