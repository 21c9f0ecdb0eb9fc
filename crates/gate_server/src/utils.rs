//! Factory helpers for building gate servers.

use crate::{config::ServerConfig, error::ServerError, server::GateServer};
use bastion_event_system::HealthSystem;

/// Creates a gate server with default configuration.
///
/// # Example
///
/// ```rust
/// use bastion_event_system::{create_health_system, HealthConfig, SetupFlag};
/// use std::sync::Arc;
///
/// let health = create_health_system(HealthConfig::default(), Arc::new(SetupFlag::new(true)));
/// let server = gate_server::create_server(health).unwrap();
/// assert_eq!(server.bind_address().port(), 8080);
/// ```
pub fn create_server(health: HealthSystem) -> Result<GateServer, ServerError> {
    GateServer::new(ServerConfig::default(), health)
}

/// Creates a gate server with custom configuration.
pub fn create_server_with_config(config: ServerConfig, health: HealthSystem) -> Result<GateServer, ServerError> {
    GateServer::new(config, health)
}
