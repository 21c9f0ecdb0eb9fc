//! Tests for gate decisions against derived application state

#[cfg(test)]
mod tests {
    use crate::admission::{AdmissionGate, GateDecision, GateStats};
    use crate::config::GateConfig;
    use bastion_event_system::{
        create_health_system, levels, types, ApplicationState, Event, EventType, HealthConfig, HealthSystem, SetupFlag,
    };
    use std::sync::Arc;

    fn running_health() -> HealthSystem {
        let health = create_health_system(HealthConfig::default(), Arc::new(SetupFlag::new(true)));
        health.state.mark_running();
        health
    }

    fn gate_with_secret(health: &HealthSystem) -> AdmissionGate {
        let config = GateConfig {
            bypass_secret: Some("s3cret".to_string()),
            ..GateConfig::default()
        };
        AdmissionGate::new(health.state.clone(), &config)
    }

    fn raise(health: &HealthSystem, level: &str) -> Event {
        let event = Event::new(EventType::new(types::DATABASE), "Database unreachable", health.level(level));
        health.events.publish(event.clone());
        event
    }

    #[test]
    fn test_healthy_system_allows() {
        let health = running_health();
        let gate = gate_with_secret(&health);
        assert_eq!(gate.decide("/api/items", None), GateDecision::Allowed);
    }

    #[test]
    fn test_error_event_rejects_then_recovers() {
        let health = running_health();
        let gate = gate_with_secret(&health);

        let event = raise(&health, levels::ERROR);
        assert_eq!(
            gate.decide("/api/items", None),
            GateDecision::Rejected(ApplicationState::Error)
        );

        health.events.discard(&event);
        assert_eq!(gate.decide("/api/items", None), GateDecision::Allowed);
    }

    #[test]
    fn test_ignore_list_wins_over_blocking_state() {
        let health = running_health();
        let gate = gate_with_secret(&health);
        raise(&health, levels::FATAL);

        assert_eq!(gate.decide("/status", None), GateDecision::Ignored);
        assert_eq!(gate.decide("/unavailable", None), GateDecision::Ignored);
        assert_eq!(gate.decide("/static/logo.png", None), GateDecision::Ignored);
    }

    #[test]
    fn test_bypass_only_with_correct_secret() {
        let health = running_health();
        let gate = gate_with_secret(&health);
        raise(&health, levels::MAINTENANCE);

        assert_eq!(gate.decide("/api/items", Some("s3cret")), GateDecision::Bypassed);
        assert_eq!(
            gate.decide("/api/items", Some("guess")),
            GateDecision::Rejected(ApplicationState::Maintenance)
        );
    }

    #[test]
    fn test_warning_does_not_block() {
        let health = running_health();
        let gate = gate_with_secret(&health);
        raise(&health, levels::WARNING);
        assert_eq!(gate.decide("/api/items", None), GateDecision::Allowed);
    }

    #[test]
    fn test_stopping_blocks() {
        let health = running_health();
        let gate = gate_with_secret(&health);
        health.state.mark_stopping();
        assert_eq!(
            gate.decide("/api/items", None),
            GateDecision::Rejected(ApplicationState::Stopping)
        );
    }

    #[test]
    fn test_disabled_gate_admits_everything() {
        let health = running_health();
        let config = GateConfig {
            enabled: false,
            ..GateConfig::default()
        };
        let gate = AdmissionGate::new(health.state.clone(), &config);
        raise(&health, levels::FATAL);
        assert_eq!(gate.decide("/api/items", None), GateDecision::Allowed);
    }

    #[test]
    fn test_gate_never_mutates_events() {
        let health = running_health();
        let gate = gate_with_secret(&health);
        raise(&health, levels::ERROR);

        let before = health.events.get_events();
        gate.decide("/api/items", None);
        gate.decide("/api/items", Some("s3cret"));
        assert_eq!(*before, *health.events.get_events());
    }

    #[test]
    fn test_stats_count_each_decision() {
        let health = running_health();
        let gate = gate_with_secret(&health);

        gate.decide("/api/items", None);
        gate.decide("/status", None);
        raise(&health, levels::ERROR);
        gate.decide("/api/items", Some("s3cret"));
        gate.decide("/api/items", None);
        gate.decide("/api/other", None);

        assert_eq!(
            gate.stats(),
            GateStats {
                allowed: 1,
                bypassed: 1,
                ignored: 1,
                rejected: 2,
            }
        );
    }
}
