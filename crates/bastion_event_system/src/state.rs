//! # Application State Derivation
//!
//! The externally visible [`ApplicationState`] is recomputed on every call to
//! [`ApplicationStateMachine::get_state`]. It combines three inputs:
//!
//! - the internal [`LifecycleFlag`] (`STARTING`, `RUNNING`, `STOPPING`)
//! - the most severe active event, ranked by the [`HealthAdvisor`]
//! - whether setup has completed (or auto-setup is enabled)
//!
//! Event driven overlays win over the happy-path flag so that a newly raised
//! critical event changes observed behaviour without any explicit transition.
//! `STOPPING` is terminal and wins over everything.
//!
//! ```text
//! STOPPING flag          → STOPPING
//! highest ≥ error        → ERROR
//! highest ≥ maintenance  → MAINTENANCE     (warning is ignored)
//! RUNNING, not set up    → FIRST_RUN
//! otherwise              → flag value
//! ```

use crate::container::EventContainer;
use crate::lifecycle::LifecycleFlag;
use crate::severity::HealthAdvisor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Externally visible application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationState {
    Starting,
    FirstRun,
    Running,
    Maintenance,
    Error,
    Stopping,
}

impl ApplicationState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: ApplicationState) -> bool {
        use ApplicationState::*;
        matches!(
            (self, next),
            (Starting, FirstRun | Running | Error | Stopping)
                | (FirstRun, Running | Maintenance | Error | Stopping)
                | (Running, Maintenance | Error | Stopping)
                | (Error, Running | Stopping)
                | (Maintenance, Running | Error | Stopping)
        )
    }

    /// States in which inbound requests are turned away.
    pub fn is_blocking(self) -> bool {
        matches!(
            self,
            ApplicationState::Maintenance | ApplicationState::Error | ApplicationState::Stopping
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationState::Starting => "STARTING",
            ApplicationState::FirstRun => "FIRST_RUN",
            ApplicationState::Running => "RUNNING",
            ApplicationState::Maintenance => "MAINTENANCE",
            ApplicationState::Error => "ERROR",
            ApplicationState::Stopping => "STOPPING",
        }
    }
}

impl fmt::Display for ApplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers whether first-time setup has been completed.
pub trait SetupStatus: Send + Sync {
    fn is_setup_complete(&self) -> bool;
}

/// Simple in-memory [`SetupStatus`].
#[derive(Debug, Clone, Default)]
pub struct SetupFlag {
    complete: Arc<AtomicBool>,
}

impl SetupFlag {
    pub fn new(complete: bool) -> Self {
        Self {
            complete: Arc::new(AtomicBool::new(complete)),
        }
    }

    pub fn mark_complete(&self) {
        self.complete.store(true, Ordering::Release);
    }
}

impl SetupStatus for SetupFlag {
    fn is_setup_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }
}

/// Thresholds used by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateThresholds {
    /// Level key at or above which the application is in `ERROR`
    pub error_level: String,
    /// Level key at or above which the application is in `MAINTENANCE`
    pub maintenance_level: String,
    /// Skip the `FIRST_RUN` overlay even when setup is incomplete
    pub auto_setup: bool,
}

impl Default for StateThresholds {
    fn default() -> Self {
        Self {
            error_level: crate::events::levels::ERROR.to_string(),
            maintenance_level: crate::events::levels::MAINTENANCE.to_string(),
            auto_setup: false,
        }
    }
}

/// Derives the single authoritative application state.
#[derive(Clone)]
pub struct ApplicationStateMachine {
    container: Arc<EventContainer>,
    advisor: HealthAdvisor,
    flag: LifecycleFlag,
    setup: Arc<dyn SetupStatus>,
    thresholds: StateThresholds,
}

impl fmt::Debug for ApplicationStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationStateMachine")
            .field("flag", &self.flag.get())
            .field("thresholds", &self.thresholds)
            .field("setup_complete", &self.setup.is_setup_complete())
            .finish()
    }
}

impl ApplicationStateMachine {
    pub fn new(
        container: Arc<EventContainer>,
        advisor: HealthAdvisor,
        flag: LifecycleFlag,
        setup: Arc<dyn SetupStatus>,
        thresholds: StateThresholds,
    ) -> Self {
        Self {
            container,
            advisor,
            flag,
            setup,
            thresholds,
        }
    }

    /// Computes the current state. Never cached.
    pub fn get_state(&self) -> ApplicationState {
        let internal = self.flag.get();
        if internal == ApplicationState::Stopping {
            return ApplicationState::Stopping;
        }

        if let Some(highest) = self.advisor.highest_level(&self.container) {
            let order = self.advisor.order();
            if order.is_key_at_least(highest.key(), &self.thresholds.error_level) {
                return ApplicationState::Error;
            }
            if order.is_key_at_least(highest.key(), &self.thresholds.maintenance_level) {
                return ApplicationState::Maintenance;
            }
        }

        if internal == ApplicationState::Running
            && !self.thresholds.auto_setup
            && !self.setup.is_setup_complete()
        {
            return ApplicationState::FirstRun;
        }

        internal
    }

    /// Startup hook: `STARTING → RUNNING`.
    pub fn mark_running(&self) -> bool {
        self.flag.mark_running()
    }

    /// Shutdown hook: anything `→ STOPPING`.
    pub fn mark_stopping(&self) -> bool {
        self.flag.mark_stopping()
    }

    pub fn lifecycle(&self) -> &LifecycleFlag {
        &self.flag
    }

    pub fn advisor(&self) -> &HealthAdvisor {
        &self.advisor
    }

    pub fn container(&self) -> &Arc<EventContainer> {
        &self.container
    }
}
