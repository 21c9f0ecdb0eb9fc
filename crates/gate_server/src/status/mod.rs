//! JSON bodies for the status, progress and unavailable responses.

use bastion_event_system::{ApplicationState, Event, HealthSystem};
use serde::{Deserialize, Serialize};

/// One active event as reported over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventView {
    #[serde(rename = "type")]
    pub event_type: String,
    pub message: String,
    pub level: String,
}

impl From<&Event> for EventView {
    fn from(event: &Event) -> Self {
        Self {
            event_type: event.event_type().key().to_string(),
            message: event.message().to_string(),
            level: event.level().key().to_string(),
        }
    }
}

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub state: ApplicationState,
    pub events: Vec<EventView>,
}

impl StatusReport {
    pub fn capture(health: &HealthSystem) -> Self {
        let state = health.state.get_state();
        let events = health.events.get_events().iter().map(EventView::from).collect();
        Self { state, events }
    }
}

/// Body of `GET /progress`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub state: ApplicationState,
}

impl ProgressReport {
    pub fn capture(health: &HealthSystem) -> Self {
        let snapshot = health.progress.snapshot();
        Self {
            progress: snapshot.progress,
            message: snapshot.message,
            state: health.state.get_state(),
        }
    }
}

/// Body of the synthesized unavailable response. Carries no error details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableBody {
    pub state: ApplicationState,
    pub message: String,
}

impl UnavailableBody {
    pub fn for_state(state: ApplicationState) -> Self {
        let message = match state {
            ApplicationState::Maintenance => "Maintenance in progress, please try again later",
            ApplicationState::Stopping => "The server is shutting down",
            _ => "The service is temporarily unavailable",
        };
        Self {
            state,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_event_system::{create_health_system, levels, types, EventType, HealthConfig, SetupFlag};
    use std::sync::Arc;

    #[test]
    fn test_status_report_lists_events() {
        let health = create_health_system(HealthConfig::default(), Arc::new(SetupFlag::new(true)));
        health.state.mark_running();
        health.events.publish(Event::new(
            EventType::new(types::UPGRADE),
            "Upgrade running",
            health.level(levels::MAINTENANCE),
        ));

        let report = StatusReport::capture(&health);
        assert_eq!(report.state, ApplicationState::Maintenance);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["state"], "MAINTENANCE");
        assert_eq!(json["events"][0]["type"], "upgrade");
        assert_eq!(json["events"][0]["level"], "maintenance");
    }

    #[test]
    fn test_progress_report() {
        let health = create_health_system(HealthConfig::default(), Arc::new(SetupFlag::new(true)));
        health.progress.advance_with_message(40, "Loading settings");

        let report = ProgressReport::capture(&health);
        assert_eq!(report.progress, 40);
        assert_eq!(report.message.as_deref(), Some("Loading settings"));
        assert_eq!(report.state, ApplicationState::Starting);
    }

    #[test]
    fn test_unavailable_body_has_no_details() {
        let body = UnavailableBody::for_state(ApplicationState::Error);
        assert_eq!(body.message, "The service is temporarily unavailable");
    }
}
