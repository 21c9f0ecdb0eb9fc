//! HTTP handlers and the admission middleware.

use crate::admission::{AdmissionGate, GateDecision};
use crate::status::{ProgressReport, StatusReport, UnavailableBody};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bastion_event_system::{ApplicationState, HealthSystem};
use cluster_coordination::{WorkKind, WorkTracker};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Shared state for every handler.
#[derive(Debug, Clone)]
pub struct GateState {
    pub health: HealthSystem,
    pub gate: Arc<AdmissionGate>,
    pub rejection_status: StatusCode,
    pub retry_after_secs: u64,
    /// In-flight accounting for admitted requests, latched during maintenance
    pub work: Option<WorkTracker>,
}

impl GateState {
    /// The synthesized unavailable response for `state`.
    pub fn unavailable(&self, state: ApplicationState) -> Response {
        let mut response = (self.rejection_status, Json(UnavailableBody::for_state(state))).into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(self.retry_after_secs));
        response
    }
}

/// Runs every request through the admission gate.
///
/// Admitted requests outside the ignore-list hold a work permit while they
/// run: safe methods count as reads, everything else as writes. A request
/// refused by a latch is reported as maintenance.
pub async fn admission_middleware(State(state): State<GateState>, request: Request, next: Next) -> Response {
    let credential = state.gate.bypass().extract(request.headers(), request.uri());
    match state.gate.decide(request.uri().path(), credential.as_deref()) {
        GateDecision::Rejected(app_state) => state.unavailable(app_state),
        GateDecision::Ignored => next.run(request).await,
        GateDecision::Allowed | GateDecision::Bypassed => {
            let Some(tracker) = &state.work else {
                return next.run(request).await;
            };
            let kind = if request.method().is_safe() {
                WorkKind::Read
            } else {
                WorkKind::Write
            };
            match tracker.try_begin(kind) {
                Ok(_permit) => next.run(request).await,
                Err(rejected) => {
                    debug!("{} for {}", rejected, request.uri().path());
                    state.unavailable(ApplicationState::Maintenance)
                }
            }
        }
    }
}

pub async fn status_handler(State(state): State<GateState>) -> Json<StatusReport> {
    Json(StatusReport::capture(&state.health))
}

pub async fn progress_handler(State(state): State<GateState>) -> Json<ProgressReport> {
    Json(ProgressReport::capture(&state.health))
}

/// The unavailable page itself, served with 200 so it can be linked to.
pub async fn unavailable_handler(State(state): State<GateState>) -> Json<UnavailableBody> {
    Json(UnavailableBody::for_state(state.health.state.get_state()))
}

pub async fn index_handler(State(state): State<GateState>) -> Json<Value> {
    Json(json!({
        "service": "bastion",
        "version": env!("CARGO_PKG_VERSION"),
        "state": state.health.state.get_state(),
    }))
}
