/// High-level API functions for wiring the health subsystem
use crate::config::HealthConfig;
use crate::lifecycle::{LifecycleFlag, StartupProgress};
use crate::severity::HealthAdvisor;
use crate::state::{ApplicationStateMachine, SetupStatus};
use crate::system::EventSystem;
use std::sync::Arc;

/// Every health service built once at the top-level wiring point.
///
/// Collaborators receive clones of the individual handles; nothing looks them
/// up through a global.
#[derive(Debug, Clone)]
pub struct HealthSystem {
    pub events: Arc<EventSystem>,
    pub advisor: HealthAdvisor,
    pub state: ApplicationStateMachine,
    pub progress: StartupProgress,
    pub config: HealthConfig,
}

impl HealthSystem {
    /// Builds an event level descriptor from the configured descriptions.
    pub fn level(&self, key: &str) -> crate::EventLevel {
        self.config.level(key)
    }
}

/// Creates the complete health subsystem from configuration.
///
/// # Examples
///
/// ```rust
/// use bastion_event_system::{create_health_system, HealthConfig, SetupFlag, ApplicationState};
/// use std::sync::Arc;
///
/// let health = create_health_system(HealthConfig::default(), Arc::new(SetupFlag::new(true)));
/// assert_eq!(health.state.get_state(), ApplicationState::Starting);
/// ```
pub fn create_health_system(config: HealthConfig, setup: Arc<dyn SetupStatus>) -> HealthSystem {
    let events = Arc::new(EventSystem::new());
    let advisor = HealthAdvisor::new(Arc::new(config.severity_order()));
    let state = ApplicationStateMachine::new(
        events.container().clone(),
        advisor.clone(),
        LifecycleFlag::new(),
        setup,
        config.thresholds(),
    );

    HealthSystem {
        events,
        advisor,
        state,
        progress: StartupProgress::new(),
        config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{levels, types, Event, EventType};
    use crate::state::{ApplicationState, SetupFlag};

    #[test]
    fn test_published_events_drive_state() {
        let health = create_health_system(HealthConfig::default(), Arc::new(SetupFlag::new(true)));
        health.state.mark_running();

        let event = Event::new(
            EventType::new(types::RESTORE),
            "Restoring from backup",
            health.level(levels::MAINTENANCE),
        );
        health.events.publish(event.clone());
        assert_eq!(health.state.get_state(), ApplicationState::Maintenance);

        health.events.discard(&event);
        assert_eq!(health.state.get_state(), ApplicationState::Running);
    }
}
