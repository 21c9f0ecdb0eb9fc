//! Severity ranking and health advice.
//!
//! [`SeverityOrder`] is a fixed, externally configured total order over level keys,
//! most severe first. [`HealthAdvisor`] applies it to the current contents of an
//! [`EventContainer`].
//!
//! Comparisons involving a level that is not part of the configured order return
//! `false` from both [`SeverityOrder::is_at_least`] and [`SeverityOrder::is_at_most`]:
//! an unconfigured level is not comparable.

use crate::container::EventContainer;
use crate::events::{levels, Event, EventLevel};
use std::collections::HashMap;
use std::sync::Arc;

/// Total order over configured level keys. Index 0 is the most severe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityOrder {
    keys: Vec<String>,
    ranks: HashMap<String, usize>,
}

impl SeverityOrder {
    /// Builds an order from level keys, most severe first.
    ///
    /// A key that appears more than once keeps its first (most severe) rank.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut ranks = HashMap::new();
        for key in keys {
            let key = key.into();
            if !ranks.contains_key(&key) {
                ranks.insert(key.clone(), ordered.len());
                ordered.push(key);
            }
        }

        Self {
            keys: ordered,
            ranks,
        }
    }

    /// Rank of a level key, or `None` if it isn't configured.
    pub fn rank_of(&self, key: &str) -> Option<usize> {
        self.ranks.get(key).copied()
    }

    /// Rank of a level, or `None` if it isn't configured.
    pub fn rank(&self, level: &EventLevel) -> Option<usize> {
        self.rank_of(level.key())
    }

    /// Whether the level key is part of the order.
    pub fn contains(&self, key: &str) -> bool {
        self.ranks.contains_key(key)
    }

    /// Configured keys, most severe first.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// `level` is at least as severe as `threshold`.
    pub fn is_at_least(&self, level: &EventLevel, threshold: &EventLevel) -> bool {
        self.is_key_at_least(level.key(), threshold.key())
    }

    /// `level` is at most as severe as `threshold`.
    pub fn is_at_most(&self, level: &EventLevel, threshold: &EventLevel) -> bool {
        self.is_key_at_most(level.key(), threshold.key())
    }

    /// Key based form of [`Self::is_at_least`].
    pub fn is_key_at_least(&self, level: &str, threshold: &str) -> bool {
        match (self.rank_of(level), self.rank_of(threshold)) {
            (Some(level), Some(threshold)) => level <= threshold,
            _ => false,
        }
    }

    /// Key based form of [`Self::is_at_most`].
    pub fn is_key_at_most(&self, level: &str, threshold: &str) -> bool {
        match (self.rank_of(level), self.rank_of(threshold)) {
            (Some(level), Some(threshold)) => level >= threshold,
            _ => false,
        }
    }
}

impl Default for SeverityOrder {
    fn default() -> Self {
        Self::new(levels::DEFAULT_ORDER)
    }
}

/// Answers severity questions about the events currently in a container.
#[derive(Debug, Clone)]
pub struct HealthAdvisor {
    order: Arc<SeverityOrder>,
}

impl HealthAdvisor {
    pub fn new(order: Arc<SeverityOrder>) -> Self {
        Self { order }
    }

    /// The ordering table this advisor ranks with.
    pub fn order(&self) -> &SeverityOrder {
        &self.order
    }

    /// Returns the most severe configured event, if any.
    ///
    /// Ties go to the earliest published event. Events whose level is not
    /// configured are ignored.
    pub fn find_highest_severity(&self, container: &EventContainer) -> Option<Event> {
        let snapshot = container.get_events();
        let mut best: Option<(usize, &Event)> = None;

        for event in snapshot.iter() {
            let Some(rank) = self.order.rank(event.level()) else {
                continue;
            };
            if best.map_or(true, |(best_rank, _)| rank < best_rank) {
                best = Some((rank, event));
            }
        }

        best.map(|(_, event)| event.clone())
    }

    /// Level of the most severe configured event, if any.
    pub fn highest_level(&self, container: &EventContainer) -> Option<EventLevel> {
        self.find_highest_severity(container)
            .map(|event| event.level().clone())
    }

    pub fn is_at_least(&self, level: &EventLevel, threshold: &EventLevel) -> bool {
        self.order.is_at_least(level, threshold)
    }

    pub fn is_at_most(&self, level: &EventLevel, threshold: &EventLevel) -> bool {
        self.order.is_at_most(level, threshold)
    }
}
