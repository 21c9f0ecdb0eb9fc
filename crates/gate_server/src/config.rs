//! Server and admission gate configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

fn default_enabled() -> bool {
    true
}

fn default_bypass_param() -> String {
    "bastion-bypass".to_string()
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        "/status".to_string(),
        "/progress".to_string(),
        "/unavailable".to_string(),
        "/static/*".to_string(),
    ]
}

fn default_rejection_status() -> u16 {
    503
}

fn default_retry_after_secs() -> u64 {
    30
}

/// Admission gate settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// When false every request is admitted
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Header name and query parameter name carrying the bypass credential
    #[serde(default = "default_bypass_param")]
    pub bypass_param: String,

    /// Shared secret that lets operators through a blocking state.
    /// Without one no request can bypass the gate.
    #[serde(default)]
    pub bypass_secret: Option<String>,

    /// Paths always passed through: exact paths, or prefixes ending in `*`
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Status code of the unavailable response (5xx)
    #[serde(default = "default_rejection_status")]
    pub rejection_status: u16,

    /// Value of the `Retry-After` header on rejections
    #[serde(default = "default_retry_after_secs")]
    pub retry_after_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            bypass_param: default_bypass_param(),
            bypass_secret: None,
            ignore_patterns: default_ignore_patterns(),
            rejection_status: default_rejection_status(),
            retry_after_secs: default_retry_after_secs(),
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.bypass_param.trim().is_empty() {
            return Err("Gate bypass parameter name cannot be empty".to_string());
        }
        if matches!(&self.bypass_secret, Some(secret) if secret.is_empty()) {
            return Err("Gate bypass secret cannot be empty when set".to_string());
        }
        if !(500..=599).contains(&self.rejection_status) {
            return Err(format!(
                "Gate rejection status must be a 5xx code, got {}",
                self.rejection_status
            ));
        }
        if let Some(pattern) = self.ignore_patterns.iter().find(|p| !p.starts_with('/')) {
            return Err(format!("Ignore pattern '{pattern}' must start with '/'"));
        }
        Ok(())
    }
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Admission gate settings
    pub gate: GateConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            gate: GateConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gate_config_is_valid() {
        assert!(GateConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_gate_settings() {
        let config = GateConfig {
            rejection_status: 429,
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GateConfig {
            bypass_secret: Some(String::new()),
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GateConfig {
            bypass_param: " ".to_string(),
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());

        let config = GateConfig {
            ignore_patterns: vec!["status".to_string()],
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
