//! Internal lifecycle flag and startup progress.
//!
//! The flag only ever moves `STARTING → RUNNING → STOPPING`, set explicitly by the
//! startup and shutdown hooks. Every other externally visible state is an overlay
//! computed by [`crate::ApplicationStateMachine`].

use crate::state::ApplicationState;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

const STARTING: u8 = 0;
const RUNNING: u8 = 1;
const STOPPING: u8 = 2;

/// Shared internal lifecycle flag.
#[derive(Debug, Clone)]
pub struct LifecycleFlag {
    phase: Arc<AtomicU8>,
}

impl LifecycleFlag {
    /// Creates a flag in the `STARTING` phase.
    pub fn new() -> Self {
        Self {
            phase: Arc::new(AtomicU8::new(STARTING)),
        }
    }

    /// Current phase as one of `Starting`, `Running` or `Stopping`.
    pub fn get(&self) -> ApplicationState {
        Self::decode(self.phase.load(Ordering::Acquire))
    }

    /// Moves `STARTING → RUNNING`. Returns false if the flag was not starting.
    pub fn mark_running(&self) -> bool {
        match self
            .phase
            .compare_exchange(STARTING, RUNNING, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                info!("🚀 Application lifecycle: STARTING → RUNNING");
                true
            }
            Err(current) => {
                warn!(
                    "Ignoring request to mark running from phase {:?}",
                    Self::decode(current)
                );
                false
            }
        }
    }

    /// Moves to `STOPPING` from any phase. Returns false if already stopping.
    pub fn mark_stopping(&self) -> bool {
        let previous = self.phase.swap(STOPPING, Ordering::AcqRel);
        if previous == STOPPING {
            return false;
        }
        info!(
            "🛑 Application lifecycle: {:?} → STOPPING",
            Self::decode(previous)
        );
        true
    }

    pub fn is_stopping(&self) -> bool {
        self.phase.load(Ordering::Acquire) == STOPPING
    }

    fn decode(raw: u8) -> ApplicationState {
        match raw {
            STARTING => ApplicationState::Starting,
            RUNNING => ApplicationState::Running,
            _ => ApplicationState::Stopping,
        }
    }
}

impl Default for LifecycleFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot returned by [`StartupProgress::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Monotonic 0–100 startup progress.
#[derive(Debug, Clone, Default)]
pub struct StartupProgress {
    value: Arc<AtomicU8>,
    message: Arc<RwLock<Option<String>>>,
}

impl StartupProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises progress to `percent` (clamped to 100). Lower values are ignored.
    ///
    /// Returns the progress after the call.
    pub fn advance_to(&self, percent: u8) -> u8 {
        let percent = percent.min(100);
        let previous = self.value.fetch_max(percent, Ordering::AcqRel);
        previous.max(percent)
    }

    /// Raises progress and records a status message.
    pub fn advance_with_message(&self, percent: u8, message: impl Into<String>) -> u8 {
        let current = self.advance_to(percent);
        if let Ok(mut slot) = self.message.write() {
            *slot = Some(message.into());
        }
        current
    }

    pub fn get(&self) -> u8 {
        self.value.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            progress: self.get(),
            message: self.message.read().ok().and_then(|m| m.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_moves_forward_only() {
        let flag = LifecycleFlag::new();
        assert_eq!(flag.get(), ApplicationState::Starting);

        assert!(flag.mark_running());
        assert!(!flag.mark_running());
        assert_eq!(flag.get(), ApplicationState::Running);

        assert!(flag.mark_stopping());
        assert!(!flag.mark_stopping());
        assert!(!flag.mark_running());
        assert_eq!(flag.get(), ApplicationState::Stopping);
    }

    #[test]
    fn test_stopping_straight_from_starting() {
        let flag = LifecycleFlag::new();
        assert!(flag.mark_stopping());
        assert!(flag.is_stopping());
    }

    #[test]
    fn test_progress_is_monotonic_and_clamped() {
        let progress = StartupProgress::new();
        assert_eq!(progress.advance_to(40), 40);
        assert_eq!(progress.advance_to(10), 40);
        assert_eq!(progress.advance_to(250), 100);
        assert_eq!(progress.get(), 100);
    }

    #[test]
    fn test_progress_snapshot_carries_message() {
        let progress = StartupProgress::new();
        progress.advance_with_message(25, "Loading configuration");
        assert_eq!(
            progress.snapshot(),
            ProgressSnapshot {
                progress: 25,
                message: Some("Loading configuration".to_string()),
            }
        );
    }
}
