//! Health configuration: severity order, level descriptions and state thresholds.

use crate::events::{levels, EventLevel};
use crate::severity::SeverityOrder;
use crate::state::StateThresholds;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

fn default_severity_order() -> Vec<String> {
    levels::DEFAULT_ORDER.iter().map(|s| s.to_string()).collect()
}

fn default_error_level() -> String {
    levels::ERROR.to_string()
}

fn default_maintenance_level() -> String {
    levels::MAINTENANCE.to_string()
}

fn default_level_descriptions() -> BTreeMap<String, String> {
    BTreeMap::from([
        (levels::FATAL.to_string(), "Fatal".to_string()),
        (levels::ERROR.to_string(), "Error".to_string()),
        (levels::SYSTEM_MAINTENANCE.to_string(), "System Maintenance".to_string()),
        (levels::MAINTENANCE.to_string(), "Maintenance".to_string()),
        (levels::WARNING.to_string(), "Warning".to_string()),
    ])
}

/// Health subsystem configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Level keys, most severe first
    #[serde(default = "default_severity_order")]
    pub severity_order: Vec<String>,
    /// Display text per level key
    #[serde(default = "default_level_descriptions")]
    pub level_descriptions: BTreeMap<String, String>,
    /// Level at or above which the application reports `ERROR`
    #[serde(default = "default_error_level")]
    pub error_level: String,
    /// Level at or above which the application reports `MAINTENANCE`
    #[serde(default = "default_maintenance_level")]
    pub maintenance_level: String,
    /// Skip the `FIRST_RUN` state even when setup has not completed
    #[serde(default)]
    pub auto_setup: bool,
    /// File whose presence marks setup as complete (None means always complete)
    #[serde(default)]
    pub setup_marker: Option<String>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            severity_order: default_severity_order(),
            level_descriptions: default_level_descriptions(),
            error_level: default_error_level(),
            maintenance_level: default_maintenance_level(),
            auto_setup: false,
            setup_marker: None,
        }
    }
}

impl HealthConfig {
    /// Builds the configured severity order.
    pub fn severity_order(&self) -> SeverityOrder {
        SeverityOrder::new(self.severity_order.iter().cloned())
    }

    /// Builds the state machine thresholds.
    pub fn thresholds(&self) -> StateThresholds {
        StateThresholds {
            error_level: self.error_level.clone(),
            maintenance_level: self.maintenance_level.clone(),
            auto_setup: self.auto_setup,
        }
    }

    /// Returns the level descriptor for a key, using the configured description
    /// or the key itself when none is configured.
    pub fn level(&self, key: &str) -> EventLevel {
        let description = self
            .level_descriptions
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string());
        EventLevel::new(key, description)
    }

    /// Validates the health configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.severity_order.is_empty() {
            return Err("Severity order cannot be empty".to_string());
        }

        let mut seen = HashSet::new();
        for key in &self.severity_order {
            if key.trim().is_empty() {
                return Err("Severity order contains an empty level".to_string());
            }
            if !seen.insert(key.as_str()) {
                return Err(format!("Severity order lists '{key}' more than once"));
            }
        }

        if !seen.contains(self.error_level.as_str()) {
            return Err(format!(
                "Error level '{}' is not part of the severity order",
                self.error_level
            ));
        }
        if !seen.contains(self.maintenance_level.as_str()) {
            return Err(format!(
                "Maintenance level '{}' is not part of the severity order",
                self.maintenance_level
            ));
        }

        let order = self.severity_order();
        if !order.is_key_at_least(&self.error_level, &self.maintenance_level) {
            return Err("Error level must be at least as severe as the maintenance level".to_string());
        }

        Ok(())
    }
}
