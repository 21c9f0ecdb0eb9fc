//! # Health Events
//!
//! This module defines the immutable operational events that subsystems publish
//! when they detect an abnormal or notable condition, together with the level and
//! type descriptors that classify them.
//!
//! ## Identity
//!
//! Events compare by full value: two events with the same type, message and level
//! are the same event for removal purposes. Nothing in an [`Event`] can change after
//! construction; collaborators that want a different message publish a new event
//! and discard the old one.
//!
//! ## Well-known keys
//!
//! The [`levels`] and [`types`] modules carry the conventional keys used across
//! the server. The ranking between levels is not encoded here; it is configuration
//! owned by [`crate::SeverityOrder`].

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Descriptors
// ============================================================================

/// Severity descriptor attached to an [`Event`].
///
/// The `level` string is the unique key used by the severity order; the
/// description is display text only but still participates in equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventLevel {
    /// Unique key, e.g. `"error"` or `"maintenance"`
    pub level: String,
    /// Human readable description
    pub description: String,
}

impl EventLevel {
    /// Creates a new level descriptor.
    pub fn new(level: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            description: description.into(),
        }
    }

    /// Returns the level key.
    pub fn key(&self) -> &str {
        &self.level
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.level)
    }
}

/// Category of an [`Event`], used to route it to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventType {
    /// Opaque routing key
    pub key: String,
    /// Optional display text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EventType {
    /// Creates an event type with no display text.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: None,
        }
    }

    /// Creates an event type with display text.
    pub fn with_description(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: Some(description.into()),
        }
    }

    /// Returns the routing key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

// ============================================================================
// Event
// ============================================================================

/// An operational event published by any subsystem.
///
/// # Examples
///
/// ```rust
/// use bastion_event_system::{Event, EventLevel, EventType};
///
/// let event = Event::new(
///     EventType::new("database"),
///     "Connection pool exhausted",
///     EventLevel::new("error", "Error"),
/// );
/// assert_eq!(event.level().key(), "error");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    event_type: EventType,
    message: String,
    level: EventLevel,
}

impl Event {
    /// Creates a new immutable event.
    pub fn new(event_type: EventType, message: impl Into<String>, level: EventLevel) -> Self {
        Self {
            event_type,
            message: message.into(),
            level,
        }
    }

    /// Returns the event type.
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// Returns the event message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the event level.
    pub fn level(&self) -> &EventLevel {
        &self.level
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.event_type, self.level, self.message)
    }
}

// ============================================================================
// Well-known keys
// ============================================================================

/// Conventional level keys, most severe first.
pub mod levels {
    pub const FATAL: &str = "fatal";
    pub const ERROR: &str = "error";
    pub const SYSTEM_MAINTENANCE: &str = "system-maintenance";
    pub const MAINTENANCE: &str = "maintenance";
    pub const WARNING: &str = "warning";

    /// Default ranking used when no severity order is configured.
    pub const DEFAULT_ORDER: [&str; 5] = [FATAL, ERROR, SYSTEM_MAINTENANCE, MAINTENANCE, WARNING];
}

/// Conventional event type keys.
pub mod types {
    pub const STARTUP: &str = "startup";
    pub const DATABASE: &str = "database";
    pub const UPGRADE: &str = "upgrade";
    pub const EXPORT: &str = "export";
    pub const IMPORT: &str = "import";
    pub const RESTORE: &str = "restore";
    pub const REINDEX: &str = "reindex";
    pub const SETUP: &str = "setup";
    pub const MAINTENANCE: &str = "maintenance";
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while registering or running event listeners.
///
/// Publishing and discarding never fail; these errors only describe listener
/// misbehaviour and are logged and counted by the event system.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Handler execution failed during event processing
    #[error("Handler execution error: {0}")]
    HandlerExecution(String),
    /// Handler registration was rejected
    #[error("Handler registration error: {0}")]
    Registration(String),
    #[error("An unexpected error occurred: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_level() -> EventLevel {
        EventLevel::new(levels::ERROR, "Error")
    }

    #[test]
    fn test_event_value_equality() {
        let a = Event::new(EventType::new(types::DATABASE), "down", error_level());
        let b = Event::new(EventType::new(types::DATABASE), "down", error_level());
        let c = Event::new(EventType::new(types::DATABASE), "up", error_level());

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_level_description_participates_in_equality() {
        let a = EventLevel::new(levels::ERROR, "Error");
        let b = EventLevel::new(levels::ERROR, "Something else");
        assert_ne!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_event_serializes_type_message_level() {
        let event = Event::new(
            EventType::with_description(types::UPGRADE, "Upgrade"),
            "Running upgrade task 42",
            EventLevel::new(levels::MAINTENANCE, "Maintenance"),
        );

        let json = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(json["type"]["key"], "upgrade");
        assert_eq!(json["message"], "Running upgrade task 42");
        assert_eq!(json["level"]["level"], "maintenance");
    }

    #[test]
    fn test_display_formatting() {
        let event = Event::new(EventType::new(types::STARTUP), "booting", error_level());
        assert_eq!(event.to_string(), "[startup/error] booting");
    }
}
