use crate::drain::DrainTimeouts;
use crate::latch::LatchMode;
use crate::lock::FailurePrecedence;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_lock_namespace() -> String {
    "bastion".to_string()
}

fn default_lock_timeout_secs() -> u64 {
    30
}

fn default_latch_mode() -> LatchMode {
    LatchMode::RejectWrites
}

/// Settings for maintenance runs and bootstrap locking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Prefix applied to every cluster lock name
    #[serde(default = "default_lock_namespace")]
    pub lock_namespace: String,
    /// How long to wait for a cluster lock before giving up
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
    #[serde(default = "default_latch_mode")]
    pub latch_mode: LatchMode,
    #[serde(default)]
    pub drain: DrainTimeouts,
    #[serde(default)]
    pub failure_precedence: FailurePrecedence,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            lock_namespace: default_lock_namespace(),
            lock_timeout_secs: default_lock_timeout_secs(),
            latch_mode: default_latch_mode(),
            drain: DrainTimeouts::default(),
            failure_precedence: FailurePrecedence::default(),
        }
    }
}

impl MaintenanceConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.lock_namespace.trim().is_empty() {
            return Err("Lock namespace cannot be empty".to_string());
        }
        if self.lock_namespace.contains(':') {
            return Err("Lock namespace cannot contain ':'".to_string());
        }
        if self.lock_timeout_secs == 0 {
            return Err("Lock timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: MaintenanceConfig = toml::from_str(
            r#"
            lock_namespace = "prod"

            [drain]
            drain_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.lock_namespace, "prod");
        assert_eq!(config.drain.drain_secs, 5);
        assert_eq!(config.drain.force_drain_secs, 30);
        assert_eq!(config.latch_mode, LatchMode::RejectWrites);
        assert_eq!(config.failure_precedence, FailurePrecedence::ReleaseFailure);
    }

    #[test]
    fn test_validation() {
        assert!(MaintenanceConfig::default().validate().is_ok());

        let config = MaintenanceConfig {
            lock_namespace: "a:b".to_string(),
            ..MaintenanceConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MaintenanceConfig {
            lock_timeout_secs: 0,
            ..MaintenanceConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
