/// Event publish and discard methods
use crate::events::Event;
use super::core::{EventSystem, DISCARD_PREFIX, PUBLISH_PREFIX, WILDCARD};
use super::handlers::EventListener;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

impl EventSystem {
    /// Publishes an event into the container and notifies listeners.
    ///
    /// Never fails: listener errors are logged and counted.
    pub fn publish(&self, event: Event) {
        self.container.publish(event.clone());
        self.stats.published.fetch_add(1, Ordering::Relaxed);
        self.dispatch(PUBLISH_PREFIX, &event);
    }

    /// Discards the first event value-equal to `event` and notifies discard
    /// listeners if something was removed.
    pub fn discard(&self, event: &Event) -> bool {
        let removed = self.container.discard(event);
        if removed {
            self.stats.discarded.fetch_add(1, Ordering::Relaxed);
            self.dispatch(DISCARD_PREFIX, event);
        }
        removed
    }

    /// Snapshot of the active events.
    #[inline]
    pub fn get_events(&self) -> crate::container::EventSnapshot {
        self.container.get_events()
    }

    #[inline]
    pub fn has_events(&self) -> bool {
        self.container.has_events()
    }

    fn dispatch(&self, prefix: &str, event: &Event) {
        let typed_key = format!("{prefix}{}", event.event_type().key());
        let wildcard_key = format!("{prefix}{WILDCARD}");

        // Clone listeners out so no shard lock is held while they run.
        let mut listeners: Vec<Arc<dyn EventListener>> = Vec::new();
        if let Some(entry) = self.handlers.get(&typed_key) {
            listeners.extend(entry.value().iter().cloned());
        }
        if let Some(entry) = self.handlers.get(&wildcard_key) {
            listeners.extend(entry.value().iter().cloned());
        }

        if listeners.is_empty() {
            debug!("No listeners for {}", typed_key);
            return;
        }

        for listener in listeners {
            if let Err(e) = listener.handle(event) {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "🟡 Listener '{}' failed for {}: {}",
                    listener.listener_name(),
                    typed_key,
                    e
                );
            }
        }
    }
}
