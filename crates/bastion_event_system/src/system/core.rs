/// Core EventSystem implementation
use crate::container::EventContainer;
use super::handlers::EventListener;
use super::stats::StatCounters;
use super::stats::EventSystemStats;
use std::sync::Arc;
use dashmap::DashMap;

/// Registry key prefix for publish listeners.
pub(super) const PUBLISH_PREFIX: &str = "publish:";
/// Registry key prefix for discard listeners.
pub(super) const DISCARD_PREFIX: &str = "discard:";
/// Type key matching every event type.
pub(super) const WILDCARD: &str = "*";

/// The health event hub shared by every collaborator.
///
/// Owns the [`EventContainer`] and a registry of listeners keyed by event type.
/// Publishing appends to the container and then calls the matching listeners
/// directly; there is no queue and no reflection-based discovery.
///
/// Uses DashMap so that registration on one type never contends with dispatch
/// on another.
pub struct EventSystem {
    /// Active events
    pub(super) container: Arc<EventContainer>,
    /// Map of `publish:<type>` / `discard:<type>` keys to listeners
    pub(super) handlers: DashMap<String, Vec<Arc<dyn EventListener>>>,
    /// Lock-free counters for monitoring
    pub(super) stats: StatCounters,
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("events", &self.container.len())
            .field("handlers", &"[handlers]")
            .field("stats", &self.stats.snapshot(self.handler_count()))
            .finish()
    }
}

impl EventSystem {
    /// Creates a new event system with an empty container and no listeners.
    pub fn new() -> Self {
        Self::with_container(Arc::new(EventContainer::new()))
    }

    /// Creates an event system around an existing container.
    pub fn with_container(container: Arc<EventContainer>) -> Self {
        Self {
            container,
            handlers: DashMap::new(),
            stats: StatCounters::default(),
        }
    }

    /// Shared handle to the underlying container.
    #[inline]
    pub fn container(&self) -> &Arc<EventContainer> {
        &self.container
    }

    /// Gets the current event system statistics
    #[inline]
    pub fn get_stats(&self) -> EventSystemStats {
        self.stats.snapshot(self.handler_count())
    }

    pub(super) fn handler_count(&self) -> usize {
        self.handlers.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}
