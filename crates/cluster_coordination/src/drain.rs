//! Latch-and-drain protocol for one maintenance task.

use crate::error::{CoordinationError, Result};
use crate::latch::{DrainStatus, Latch, LatchMode, LatchableService};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

fn default_drain_secs() -> u64 {
    30
}

fn default_force_drain_secs() -> u64 {
    30
}

/// Drain timeouts in seconds. A force-drain timeout of 0 disables force draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainTimeouts {
    #[serde(default = "default_drain_secs")]
    pub drain_secs: u64,
    #[serde(default = "default_force_drain_secs")]
    pub force_drain_secs: u64,
}

impl Default for DrainTimeouts {
    fn default() -> Self {
        Self {
            drain_secs: default_drain_secs(),
            force_drain_secs: default_force_drain_secs(),
        }
    }
}

impl DrainTimeouts {
    pub fn new(drain_secs: u64, force_drain_secs: u64) -> Self {
        Self {
            drain_secs,
            force_drain_secs,
        }
    }

    pub fn drain(&self) -> Duration {
        Duration::from_secs(self.drain_secs)
    }

    pub fn force_drain(&self) -> Duration {
        Duration::from_secs(self.force_drain_secs)
    }
}

/// Latches services and drains them, one maintenance task at a time.
///
/// Cancellation is scoped to this coordinator. [`cancel`](Self::cancel)
/// interrupts a drain only while one is being waited on; at any other time it
/// just records the request, which [`cancel_requested`](Self::cancel_requested)
/// exposes to the owning task. The owning task consumes the request with
/// [`take_cancel_request`](Self::take_cancel_request) so it never outlives
/// one maintenance run.
#[derive(Debug, Default)]
pub struct DrainCoordinator {
    waiting: Mutex<Option<CancellationToken>>,
    cancel_requested: AtomicBool,
}

impl DrainCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latches `service` in `mode` and drains it.
    ///
    /// 1. drain for `drain_secs`; success returns the latch
    /// 2. otherwise, with `force_drain_secs` > 0, force drain for that long
    /// 3. otherwise fail with [`CoordinationError::DrainFailed`]
    ///
    /// A service that fails to drain stays latched.
    pub async fn latch_and_drain(
        &self,
        service: &dyn LatchableService,
        mode: LatchMode,
        timeouts: DrainTimeouts,
    ) -> Result<Arc<dyn Latch>> {
        let latch = service.acquire_latch(mode)?;
        self.drain_latched(service.service_name(), latch.as_ref(), timeouts)
            .await?;
        Ok(latch)
    }

    /// Runs the drain protocol against the latch `service` currently holds.
    ///
    /// Fails with [`CoordinationError::IllegalLatchState`] if the service is
    /// not latched.
    pub async fn drain_latch(&self, service: &dyn LatchableService, timeouts: DrainTimeouts) -> Result<()> {
        let latch = service
            .current_latch()
            .ok_or_else(|| CoordinationError::illegal_latch(service.service_name(), "cannot drain without a latch"))?;
        self.drain_latched(service.service_name(), latch.as_ref(), timeouts)
            .await
    }

    async fn drain_latched(&self, service: &str, latch: &dyn Latch, timeouts: DrainTimeouts) -> Result<()> {
        let cancelled = || CoordinationError::Cancelled {
            service: service.to_string(),
        };

        let token = self.begin_wait();
        let status = latch.drain(timeouts.drain(), &token).await;
        self.end_wait();

        match status {
            DrainStatus::Drained => {
                info!("✅ Service '{}' drained", service);
                return Ok(());
            }
            DrainStatus::Cancelled => return Err(cancelled()),
            DrainStatus::TimedOut => {}
        }

        if timeouts.force_drain_secs == 0 {
            error!(
                "❌ Service '{}' did not drain within {}s and force drain is disabled",
                service, timeouts.drain_secs
            );
            return Err(self.drain_failed(service, timeouts));
        }

        warn!(
            "⏳ Service '{}' did not drain within {}s, force draining for {}s",
            service, timeouts.drain_secs, timeouts.force_drain_secs
        );
        let token = self.begin_wait();
        let status = latch.force_drain(timeouts.force_drain(), &token).await;
        self.end_wait();

        match status {
            DrainStatus::Drained => {
                info!("✅ Service '{}' force drained", service);
                Ok(())
            }
            DrainStatus::Cancelled => Err(cancelled()),
            DrainStatus::TimedOut => {
                error!("❌ Service '{}' failed to force drain; it remains latched", service);
                Err(self.drain_failed(service, timeouts))
            }
        }
    }

    /// Lifts the latch on `service`.
    pub fn unlatch(&self, service: &dyn LatchableService) -> Result<()> {
        service.unlatch()
    }

    /// Requests cancellation. Returns true if a drain wait was interrupted.
    pub fn cancel(&self) -> bool {
        self.cancel_requested.store(true, Ordering::SeqCst);
        let waiting = self.lock_waiting().take();

        match waiting {
            Some(token) => {
                info!("🛑 Cancelling drain in progress");
                token.cancel();
                true
            }
            None => {
                debug!("Cancellation requested while no drain is in progress");
                false
            }
        }
    }

    /// Whether a cancellation request is pending.
    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    /// Returns and clears the pending cancellation request.
    pub fn take_cancel_request(&self) -> bool {
        self.cancel_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a fresh token as the current waiter.
    fn begin_wait(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.lock_waiting() = Some(token.clone());
        token
    }

    fn end_wait(&self) {
        *self.lock_waiting() = None;
    }

    fn lock_waiting(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.waiting.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn drain_failed(&self, service: &str, timeouts: DrainTimeouts) -> CoordinationError {
        CoordinationError::DrainFailed {
            service: service.to_string(),
            drain_timeout: timeouts.drain(),
            force_drain_timeout: timeouts.force_drain(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{WorkKind, WorkTracker};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct ScriptedLatch {
        drain: DrainStatus,
        force: DrainStatus,
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl Latch for ScriptedLatch {
        fn mode(&self) -> LatchMode {
            LatchMode::RejectAll
        }

        async fn drain(&self, _timeout: Duration, _cancel: &CancellationToken) -> DrainStatus {
            self.calls.lock().unwrap().push("drain");
            self.drain
        }

        async fn force_drain(&self, _timeout: Duration, _cancel: &CancellationToken) -> DrainStatus {
            self.calls.lock().unwrap().push("force_drain");
            self.force
        }

        fn is_drained(&self) -> bool {
            false
        }
    }

    struct ScriptedService {
        latch: Arc<ScriptedLatch>,
        latched: AtomicBool,
    }

    impl ScriptedService {
        fn new(drain: DrainStatus, force: DrainStatus) -> Self {
            Self {
                latch: Arc::new(ScriptedLatch {
                    drain,
                    force,
                    calls: Mutex::new(Vec::new()),
                }),
                latched: AtomicBool::new(false),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.latch.calls.lock().unwrap().clone()
        }
    }

    impl LatchableService for ScriptedService {
        fn service_name(&self) -> &str {
            "scripted"
        }

        fn acquire_latch(&self, _mode: LatchMode) -> Result<Arc<dyn Latch>> {
            self.latched.store(true, Ordering::SeqCst);
            Ok(self.latch.clone())
        }

        fn current_latch(&self) -> Option<Arc<dyn Latch>> {
            if self.latched.load(Ordering::SeqCst) {
                Some(self.latch.clone())
            } else {
                None
            }
        }

        fn unlatch(&self) -> Result<()> {
            self.latched.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_drain_success_skips_force_drain() {
        let service = ScriptedService::new(DrainStatus::Drained, DrainStatus::TimedOut);
        let coordinator = DrainCoordinator::new();

        let result = coordinator
            .latch_and_drain(&service, LatchMode::RejectAll, DrainTimeouts::new(1, 1))
            .await;
        assert!(result.is_ok());
        assert_eq!(service.calls(), vec!["drain"]);
    }

    #[tokio::test]
    async fn test_immediate_drain_success_skips_force_drain() {
        let service = ScriptedService::new(DrainStatus::Drained, DrainStatus::Drained);
        let coordinator = DrainCoordinator::new();

        let result = coordinator
            .latch_and_drain(&service, LatchMode::RejectAll, DrainTimeouts::new(0, 5))
            .await;
        assert!(result.is_ok());
        assert_eq!(service.calls(), vec!["drain"]);
    }

    #[tokio::test]
    async fn test_idle_tracker_drains_immediately_with_zero_timeout() {
        let tracker = WorkTracker::new("search");
        let coordinator = DrainCoordinator::new();

        let started = tokio::time::Instant::now();
        let latch = coordinator
            .latch_and_drain(&tracker, LatchMode::RejectAll, DrainTimeouts::new(0, 5))
            .await
            .unwrap();
        assert!(latch.is_drained());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_drain_latch_requires_current_latch() {
        let tracker = WorkTracker::new("search");
        let coordinator = DrainCoordinator::new();

        tracker.acquire_latch(LatchMode::RejectWrites).unwrap();
        coordinator.drain_latch(&tracker, DrainTimeouts::new(0, 0)).await.unwrap();

        coordinator.unlatch(&tracker).unwrap();
        let result = coordinator.drain_latch(&tracker, DrainTimeouts::new(0, 0)).await;
        assert!(matches!(result, Err(CoordinationError::IllegalLatchState { .. })));
    }

    #[tokio::test]
    async fn test_force_drain_rescues_slow_service() {
        let service = ScriptedService::new(DrainStatus::TimedOut, DrainStatus::Drained);
        let coordinator = DrainCoordinator::new();

        let result = coordinator
            .latch_and_drain(&service, LatchMode::RejectAll, DrainTimeouts::new(1, 1))
            .await;
        assert!(result.is_ok());
        assert_eq!(service.calls(), vec!["drain", "force_drain"]);
    }

    #[tokio::test]
    async fn test_disabled_force_drain_fails_and_stays_latched() {
        let service = ScriptedService::new(DrainStatus::TimedOut, DrainStatus::Drained);
        let coordinator = DrainCoordinator::new();

        let result = coordinator
            .latch_and_drain(&service, LatchMode::RejectAll, DrainTimeouts::new(1, 0))
            .await;
        assert!(matches!(result, Err(CoordinationError::DrainFailed { .. })));
        assert_eq!(service.calls(), vec!["drain"]);
        assert!(service.is_latched());
    }

    #[tokio::test]
    async fn test_failed_force_drain_stays_latched() {
        let service = ScriptedService::new(DrainStatus::TimedOut, DrainStatus::TimedOut);
        let coordinator = DrainCoordinator::new();

        let result = coordinator
            .latch_and_drain(&service, LatchMode::RejectAll, DrainTimeouts::new(1, 1))
            .await;
        assert!(matches!(result, Err(CoordinationError::DrainFailed { .. })));
        assert_eq!(service.calls(), vec!["drain", "force_drain"]);
        assert!(service.is_latched());

        coordinator.unlatch(&service).unwrap();
        assert!(!service.is_latched());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_waiting_drain() {
        let tracker = Arc::new(WorkTracker::new("search"));
        let _permit = tracker.try_begin(WorkKind::Write).unwrap();
        let coordinator = Arc::new(DrainCoordinator::new());

        let task = {
            let tracker = tracker.clone();
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .latch_and_drain(tracker.as_ref(), LatchMode::RejectAll, DrainTimeouts::new(60, 60))
                    .await
                    .map(|_| ())
            })
        };

        while !tracker.is_latched() {
            tokio::task::yield_now().await;
        }

        assert!(coordinator.cancel());
        let result = task.await.unwrap();
        assert!(matches!(result, Err(CoordinationError::Cancelled { .. })));
        assert!(coordinator.cancel_requested());
        assert!(tracker.is_latched());
    }

    #[tokio::test]
    async fn test_cancel_outside_drain_only_records_intent() {
        let tracker = WorkTracker::new("search");
        let coordinator = DrainCoordinator::new();

        assert!(!coordinator.cancel());
        assert!(coordinator.cancel_requested());
        assert!(coordinator.take_cancel_request());
        assert!(!coordinator.cancel_requested());
        assert!(!coordinator.take_cancel_request());

        // The next drain gets its own token and is not interrupted.
        let result = coordinator
            .latch_and_drain(&tracker, LatchMode::RejectWrites, DrainTimeouts::new(1, 0))
            .await;
        assert!(result.is_ok());
    }
}
