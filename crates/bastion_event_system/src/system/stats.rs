/// Statistics tracking for the event system
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Event system statistics for monitoring
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSystemStats {
    /// Total number of registered listeners
    pub total_handlers: usize,
    /// Events published since system start
    pub events_published: u64,
    /// Events actually removed by a discard since system start
    pub events_discarded: u64,
    /// Listener invocations that returned an error
    pub handler_failures: u64,
}

#[derive(Debug, Default)]
pub(super) struct StatCounters {
    pub(super) published: AtomicU64,
    pub(super) discarded: AtomicU64,
    pub(super) failures: AtomicU64,
}

impl StatCounters {
    pub(super) fn snapshot(&self, total_handlers: usize) -> EventSystemStats {
        EventSystemStats {
            total_handlers,
            events_published: self.published.load(Ordering::Relaxed),
            events_discarded: self.discarded.load(Ordering::Relaxed),
            handler_failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
