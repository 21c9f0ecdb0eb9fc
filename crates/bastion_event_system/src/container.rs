//! Copy-on-write container for active health events.
//!
//! Readers load the current `Arc<Vec<Event>>` without taking a lock; writers build
//! a fresh vector and swap it in with `ArcSwap::rcu`, retrying if another writer
//! got there first. A snapshot handed out by [`EventContainer::get_events`] is
//! never mutated afterwards, so iterating it can't observe a partial publish.

use crate::events::Event;
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::debug;

/// Point-in-time immutable view of the container.
pub type EventSnapshot = Arc<Vec<Event>>;

/// Thread-safe, ordered multiset of active events.
#[derive(Debug)]
pub struct EventContainer {
    events: ArcSwap<Vec<Event>>,
}

impl EventContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self {
            events: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Appends an event. Never blocks readers and never rejects.
    pub fn publish(&self, event: Event) {
        debug!("📥 Publishing event {}", event);
        self.events.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(event.clone());
            next
        });
    }

    /// Removes the first event value-equal to `event`.
    ///
    /// Returns `true` if an event was removed; a missing event is a no-op.
    pub fn discard(&self, event: &Event) -> bool {
        let mut removed = false;
        self.events.rcu(|current| {
            removed = false;
            let mut next = Vec::clone(current);
            if let Some(index) = next.iter().position(|candidate| candidate == event) {
                next.remove(index);
                removed = true;
            }
            next
        });

        if removed {
            debug!("📤 Discarded event {}", event);
        }
        removed
    }

    /// Returns an immutable snapshot of the active events in publish order.
    pub fn get_events(&self) -> EventSnapshot {
        self.events.load_full()
    }

    /// Fast non-empty check.
    pub fn has_events(&self) -> bool {
        !self.events.load().is_empty()
    }

    /// Number of active events.
    pub fn len(&self) -> usize {
        self.events.load().len()
    }

    /// Returns true when no events are active.
    pub fn is_empty(&self) -> bool {
        !self.has_events()
    }
}

impl Default for EventContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{levels, EventLevel, EventType};
    use std::thread;

    fn event(message: &str) -> Event {
        Event::new(
            EventType::new("test"),
            message,
            EventLevel::new(levels::ERROR, "Error"),
        )
    }

    fn assert_invariant(container: &EventContainer) {
        assert_eq!(container.has_events(), !container.get_events().is_empty());
    }

    #[test]
    fn test_has_events_matches_snapshot_across_sequence() {
        let container = EventContainer::new();
        assert_invariant(&container);

        container.publish(event("a"));
        assert_invariant(&container);
        container.publish(event("b"));
        assert_invariant(&container);
        container.publish(event("a"));
        assert_invariant(&container);

        assert!(container.discard(&event("a")));
        assert_invariant(&container);
        assert!(!container.discard(&event("missing")));
        assert_invariant(&container);
        assert!(container.discard(&event("b")));
        assert_invariant(&container);
        assert!(container.discard(&event("a")));
        assert_invariant(&container);

        assert!(!container.has_events());
    }

    #[test]
    fn test_discard_removes_only_first_match() {
        let container = EventContainer::new();
        container.publish(event("dup"));
        container.publish(event("other"));
        container.publish(event("dup"));

        container.discard(&event("dup"));

        let snapshot = container.get_events();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0], event("other"));
        assert_eq!(snapshot[1], event("dup"));
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_mutation() {
        let container = EventContainer::new();
        container.publish(event("first"));

        let snapshot = container.get_events();
        container.publish(event("second"));
        container.discard(&event("first"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0], event("first"));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_concurrent_publish_loses_no_updates() {
        const WRITERS: usize = 8;
        const PER_WRITER: usize = 200;

        let container = Arc::new(EventContainer::new());
        let writers: Vec<_> = (0..WRITERS)
            .map(|writer| {
                let container = container.clone();
                thread::spawn(move || {
                    for i in 0..PER_WRITER {
                        container.publish(event(&format!("{writer}-{i}")));
                        // Our own publish happened-before this read.
                        let seen = container.get_events();
                        assert!(seen.iter().any(|e| e.message() == format!("{writer}-{i}")));
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let container = container.clone();
                thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..500 {
                        let len = container.get_events().len();
                        // Append-only workload: a later read never sees fewer events.
                        assert!(len >= last);
                        last = len;
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().expect("worker thread panicked");
        }

        assert_eq!(container.len(), WRITERS * PER_WRITER);
    }
}
