use super::credential::BypassCredential;
use super::ignore::IgnoreList;
use crate::config::GateConfig;
use bastion_event_system::{ApplicationState, ApplicationStateMachine};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// What the gate decided for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Path is on the ignore-list
    Ignored,
    /// Nothing blocking is active
    Allowed,
    /// Blocked state, but a valid bypass credential was supplied
    Bypassed,
    /// Turned away with the blocking state
    Rejected(ApplicationState),
}

impl GateDecision {
    pub fn admits(&self) -> bool {
        !matches!(self, GateDecision::Rejected(_))
    }
}

/// Decision counters since the gate was built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GateStats {
    pub allowed: u64,
    pub bypassed: u64,
    pub ignored: u64,
    pub rejected: u64,
}

#[derive(Debug, Default)]
struct GateCounters {
    allowed: AtomicU64,
    bypassed: AtomicU64,
    ignored: AtomicU64,
    rejected: AtomicU64,
}

/// Request-path guard driven by the derived application state.
///
/// The gate only reads: it never publishes or discards events.
#[derive(Debug)]
pub struct AdmissionGate {
    state: ApplicationStateMachine,
    enabled: bool,
    ignore: IgnoreList,
    bypass: BypassCredential,
    counters: GateCounters,
}

impl AdmissionGate {
    pub fn new(state: ApplicationStateMachine, config: &GateConfig) -> Self {
        if config.enabled && config.bypass_secret.is_none() {
            info!("🚧 Admission gate enabled without a bypass secret; bypass is disabled");
        }
        Self {
            state,
            enabled: config.enabled,
            ignore: IgnoreList::new(&config.ignore_patterns),
            bypass: BypassCredential::new(config.bypass_param.clone(), config.bypass_secret.clone()),
            counters: GateCounters::default(),
        }
    }

    pub fn bypass(&self) -> &BypassCredential {
        &self.bypass
    }

    /// Decides whether a request for `path` goes through.
    ///
    /// Checked in order: ignore-list, derived state, bypass credential.
    pub fn decide(&self, path: &str, credential: Option<&str>) -> GateDecision {
        let decision = self.evaluate(path, credential);
        let counter = match decision {
            GateDecision::Ignored => &self.counters.ignored,
            GateDecision::Allowed => &self.counters.allowed,
            GateDecision::Bypassed => &self.counters.bypassed,
            GateDecision::Rejected(_) => &self.counters.rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        decision
    }

    fn evaluate(&self, path: &str, credential: Option<&str>) -> GateDecision {
        if !self.enabled {
            return GateDecision::Allowed;
        }
        if self.ignore.matches(path) {
            return GateDecision::Ignored;
        }

        let state = self.state.get_state();
        if !state.is_blocking() {
            return GateDecision::Allowed;
        }

        if self.bypass.verify(credential) {
            debug!("Bypass credential accepted for {} while {}", path, state);
            return GateDecision::Bypassed;
        }

        debug!("Rejecting {} while {}", path, state);
        GateDecision::Rejected(state)
    }

    pub fn stats(&self) -> GateStats {
        GateStats {
            allowed: self.counters.allowed.load(Ordering::Relaxed),
            bypassed: self.counters.bypassed.load(Ordering::Relaxed),
            ignored: self.counters.ignored.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }
}
