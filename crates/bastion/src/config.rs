//! Configuration management for the Bastion server.
//!
//! Loads the TOML file, applies defaults for every missing field and converts
//! the result into the settings each subsystem expects.

use bastion_event_system::HealthConfig;
use cluster_coordination::MaintenanceConfig;
use gate_server::{GateConfig, ServerConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_monitor_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server-specific configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Network address to bind the server to (e.g., "127.0.0.1:8080")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Seconds to wait for in-flight requests during shutdown
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
    /// Seconds between health summary log lines
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            monitor_interval_secs: default_monitor_interval(),
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
    /// Optional file path for log output (None means stdout only)
    #[serde(default)]
    pub file_path: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, writing a default file first if none exists.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Converts to the gate server configuration.
    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        Ok(ServerConfig {
            bind_address: self.server.bind_address.parse()?,
            gate: self.gate.clone(),
        })
    }

    /// Validates the configuration, describing the first invalid setting.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!("Invalid bind address: {}", &self.server.bind_address));
        }

        if self.server.monitor_interval_secs == 0 {
            return Err("server.monitor_interval_secs must be greater than 0".to_string());
        }

        self.health.validate().map_err(|e| format!("health: {e}"))?;
        self.gate.validate().map_err(|e| format!("gate: {e}"))?;
        self.maintenance.validate().map_err(|e| format!("maintenance: {e}"))?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_event_system::levels;
    use cluster_coordination::{FailurePrecedence, LatchMode};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert_eq!(config.server.shutdown_timeout_secs, 10);
        assert_eq!(config.health.error_level, levels::ERROR);
        assert_eq!(config.gate.rejection_status, 503);
        assert_eq!(config.maintenance.lock_namespace, "bastion");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file_creates_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert!(path.exists());

        // The written file loads back to the same settings.
        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.health, config.health);
        assert_eq!(reloaded.gate, config.gate);
        assert_eq!(reloaded.maintenance, config.maintenance);
    }

    #[tokio::test]
    async fn test_load_from_existing_file() {
        let toml_content = r#"
[server]
bind_address = "0.0.0.0:3000"

[health]
severity_order = ["fatal", "error", "maintenance", "warning"]
auto_setup = true

[gate]
bypass_secret = "s3cret"
ignore_patterns = ["/status", "/assets/*"]
retry_after_secs = 5

[maintenance]
lock_namespace = "prod"
latch_mode = "reject_all"
failure_precedence = "operation_failure"

[maintenance.drain]
drain_secs = 10
force_drain_secs = 0

[logging]
level = "debug"
json_format = true
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();
        let path = file.path().to_path_buf();

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:3000");
        assert_eq!(config.server.monitor_interval_secs, 60);
        assert_eq!(config.health.severity_order.len(), 4);
        assert!(config.health.auto_setup);
        assert_eq!(config.gate.bypass_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.gate.retry_after_secs, 5);
        assert_eq!(config.maintenance.latch_mode, LatchMode::RejectAll);
        assert_eq!(config.maintenance.failure_precedence, FailurePrecedence::OperationFailure);
        assert_eq!(config.maintenance.drain.force_drain_secs, 0);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_invalid_toml_fails() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[server\nbind_address = ").unwrap();
        let path = file.path().to_path_buf();

        assert!(AppConfig::load_from_file(&path).await.is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.bind_address = "invalid".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.health.severity_order.clear();
        assert!(config.validate().unwrap_err().starts_with("health:"));

        let mut config = AppConfig::default();
        config.gate.rejection_status = 404;
        assert!(config.validate().unwrap_err().starts_with("gate:"));

        let mut config = AppConfig::default();
        config.maintenance.lock_timeout_secs = 0;
        assert!(config.validate().unwrap_err().starts_with("maintenance:"));
    }

    #[test]
    fn test_to_server_config() {
        let mut config = AppConfig::default();
        config.server.bind_address = "0.0.0.0:9000".to_string();
        let server_config = config.to_server_config().unwrap();
        assert_eq!(server_config.bind_address.port(), 9000);
        assert_eq!(server_config.gate, config.gate);
    }
}
