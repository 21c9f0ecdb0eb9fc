/// Admission control - ignore-list, bypass credential and the gate itself
mod credential;
mod gate;
mod ignore;
mod tests;

pub use credential::{constant_time_eq, BypassCredential};
pub use gate::{AdmissionGate, GateDecision, GateStats};
pub use ignore::IgnoreList;
