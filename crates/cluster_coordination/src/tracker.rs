//! In-flight work accounting for a latchable service.
//!
//! Every unit of work holds a [`WorkPermit`] for its duration. Latching the
//! tracker stops new permits of the restricted kind from being issued, and the
//! latch drains by waiting for the outstanding count to reach zero. Completion
//! is notification-driven; nothing polls.

use crate::error::{CoordinationError, Result};
use crate::latch::{DrainStatus, Latch, LatchMode, LatchableService};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The kind of work a permit covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkKind {
    Read,
    Write,
}

impl LatchMode {
    /// Whether new work of `kind` is refused under this mode.
    pub fn rejects(&self, kind: WorkKind) -> bool {
        match self {
            LatchMode::RejectAll => true,
            LatchMode::RejectWrites => kind == WorkKind::Write,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Service '{service}' is latched ({mode:?}), {kind:?} work rejected")]
pub struct WorkRejected {
    pub service: String,
    pub kind: WorkKind,
    pub mode: LatchMode,
}

#[derive(Debug)]
struct TrackerState {
    latch: Option<Arc<TrackerLatch>>,
    abort: CancellationToken,
}

#[derive(Debug)]
struct TrackerInner {
    name: String,
    reads: AtomicUsize,
    writes: AtomicUsize,
    idle: Notify,
    state: Mutex<TrackerState>,
}

impl TrackerInner {
    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn counter(&self, kind: WorkKind) -> &AtomicUsize {
        match kind {
            WorkKind::Read => &self.reads,
            WorkKind::Write => &self.writes,
        }
    }

    /// Work that a latch in `mode` has to wait for.
    fn outstanding_for(&self, mode: LatchMode) -> usize {
        let writes = self.writes.load(Ordering::SeqCst);
        match mode {
            LatchMode::RejectWrites => writes,
            LatchMode::RejectAll => writes + self.reads.load(Ordering::SeqCst),
        }
    }
}

/// Tracks outstanding work for one named service.
#[derive(Debug, Clone)]
pub struct WorkTracker {
    inner: Arc<TrackerInner>,
}

impl WorkTracker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                name: name.into(),
                reads: AtomicUsize::new(0),
                writes: AtomicUsize::new(0),
                idle: Notify::new(),
                state: Mutex::new(TrackerState {
                    latch: None,
                    abort: CancellationToken::new(),
                }),
            }),
        }
    }

    /// Starts a unit of work, or refuses it if the current latch forbids `kind`.
    ///
    /// The permit must be held until the work completes.
    pub fn try_begin(&self, kind: WorkKind) -> std::result::Result<WorkPermit, WorkRejected> {
        let state = self.inner.lock_state();
        if let Some(latch) = &state.latch {
            if latch.mode.rejects(kind) {
                return Err(WorkRejected {
                    service: self.inner.name.clone(),
                    kind,
                    mode: latch.mode,
                });
            }
        }

        // Counted while the state lock is held so a concurrent latch sees it.
        self.inner.counter(kind).fetch_add(1, Ordering::SeqCst);
        Ok(WorkPermit {
            inner: self.inner.clone(),
            kind,
            abort: state.abort.clone(),
        })
    }

    /// Total permits currently held.
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding_for(LatchMode::RejectAll)
    }

    pub fn outstanding_of(&self, kind: WorkKind) -> usize {
        self.inner.counter(kind).load(Ordering::SeqCst)
    }
}

impl LatchableService for WorkTracker {
    fn service_name(&self) -> &str {
        &self.inner.name
    }

    fn acquire_latch(&self, mode: LatchMode) -> Result<Arc<dyn Latch>> {
        let mut state = self.inner.lock_state();
        if let Some(existing) = &state.latch {
            return Err(CoordinationError::illegal_latch(
                &self.inner.name,
                format!("already latched ({:?})", existing.mode),
            ));
        }

        let latch = Arc::new(TrackerLatch {
            inner: Arc::downgrade(&self.inner),
            service: self.inner.name.clone(),
            mode,
            drained: AtomicBool::new(false),
        });
        state.latch = Some(latch.clone());
        info!("🔒 Latched service '{}' ({:?})", self.inner.name, mode);
        Ok(latch)
    }

    fn current_latch(&self) -> Option<Arc<dyn Latch>> {
        self.inner
            .lock_state()
            .latch
            .clone()
            .map(|latch| latch as Arc<dyn Latch>)
    }

    fn unlatch(&self) -> Result<()> {
        let mut state = self.inner.lock_state();
        match state.latch.take() {
            Some(latch) => {
                info!("🔓 Unlatched service '{}' ({:?})", self.inner.name, latch.mode);
                Ok(())
            }
            None => Err(CoordinationError::illegal_latch(&self.inner.name, "not latched")),
        }
    }
}

/// Proof that a unit of work is in flight. Dropping it completes the work.
#[derive(Debug)]
pub struct WorkPermit {
    inner: Arc<TrackerInner>,
    kind: WorkKind,
    abort: CancellationToken,
}

impl WorkPermit {
    pub fn kind(&self) -> WorkKind {
        self.kind
    }

    /// Cancelled when a force drain asks in-flight work to stop early.
    pub fn abort_signal(&self) -> &CancellationToken {
        &self.abort
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_cancelled()
    }
}

impl Drop for WorkPermit {
    fn drop(&mut self) {
        let previous = self.inner.counter(self.kind).fetch_sub(1, Ordering::SeqCst);
        if previous == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

#[derive(Debug)]
struct TrackerLatch {
    inner: Weak<TrackerInner>,
    service: String,
    mode: LatchMode,
    drained: AtomicBool,
}

impl TrackerLatch {
    async fn wait_for_quiescence(&self, timeout: Duration, cancel: &CancellationToken) -> DrainStatus {
        let Some(inner) = self.inner.upgrade() else {
            return DrainStatus::Drained;
        };
        let deadline = Instant::now() + timeout;

        loop {
            let notified = inner.idle.notified();
            tokio::pin!(notified);
            // Registered before the count is read so a completion in between is not lost.
            notified.as_mut().enable();

            if inner.outstanding_for(self.mode) == 0 {
                return DrainStatus::Drained;
            }
            if cancel.is_cancelled() {
                return DrainStatus::Cancelled;
            }
            if Instant::now() >= deadline {
                return DrainStatus::TimedOut;
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep_until(deadline) => {}
                _ = cancel.cancelled() => return DrainStatus::Cancelled,
            }
        }
    }

    fn record(&self, status: DrainStatus) -> DrainStatus {
        self.drained.store(status.is_drained(), Ordering::SeqCst);
        status
    }
}

#[async_trait]
impl Latch for TrackerLatch {
    fn mode(&self) -> LatchMode {
        self.mode
    }

    async fn drain(&self, timeout: Duration, cancel: &CancellationToken) -> DrainStatus {
        debug!("Draining '{}' for up to {:?}", self.service, timeout);
        let status = self.wait_for_quiescence(timeout, cancel).await;
        self.record(status)
    }

    async fn force_drain(&self, timeout: Duration, cancel: &CancellationToken) -> DrainStatus {
        if let Some(inner) = self.inner.upgrade() {
            let mut state = inner.lock_state();
            let in_flight = inner.outstanding_for(self.mode);
            warn!(
                "⚠️ Force draining '{}': aborting {} in-flight operation(s)",
                self.service, in_flight
            );
            state.abort.cancel();
            state.abort = CancellationToken::new();
        }

        let status = self.wait_for_quiescence(timeout, cancel).await;
        self.record(status)
    }

    fn is_drained(&self) -> bool {
        self.drained.load(Ordering::SeqCst)
    }
}
