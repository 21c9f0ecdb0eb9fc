//! Core gate server implementation.

use crate::admission::{AdmissionGate, GateStats};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::server::handlers::{
    admission_middleware, index_handler, progress_handler, status_handler, unavailable_handler, GateState,
};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{middleware, Router};
use bastion_event_system::HealthSystem;
use cluster_coordination::WorkTracker;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// HTTP front door: status endpoints plus application routes, all behind the
/// admission gate.
#[derive(Debug)]
pub struct GateServer {
    config: ServerConfig,
    state: GateState,
    routes: Router<GateState>,
    shutdown: CancellationToken,
}

impl GateServer {
    /// Builds the server, rejecting invalid gate settings.
    pub fn new(config: ServerConfig, health: HealthSystem) -> Result<Self, ServerError> {
        config.gate.validate().map_err(ServerError::Configuration)?;
        let rejection_status = StatusCode::from_u16(config.gate.rejection_status)
            .map_err(|e| ServerError::Configuration(e.to_string()))?;

        let gate = Arc::new(AdmissionGate::new(health.state.clone(), &config.gate));
        let state = GateState {
            health,
            gate,
            rejection_status,
            retry_after_secs: config.gate.retry_after_secs,
            work: None,
        };

        Ok(Self {
            config,
            state,
            routes: Router::new().route("/", get(index_handler)),
            shutdown: CancellationToken::new(),
        })
    }

    /// Replaces the application routes served behind the gate.
    pub fn with_routes(mut self, routes: Router<GateState>) -> Self {
        self.routes = routes;
        self
    }

    /// Tracks admitted requests in `tracker` so they can be latched and drained.
    pub fn with_work_tracker(mut self, tracker: WorkTracker) -> Self {
        self.state.work = Some(tracker);
        self
    }

    pub fn gate_stats(&self) -> GateStats {
        self.state.gate.stats()
    }

    pub fn bind_address(&self) -> SocketAddr {
        self.config.bind_address
    }

    /// The complete router with the admission layer applied.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/status", get(status_handler))
            .route("/progress", get(progress_handler))
            .route("/unavailable", get(unavailable_handler))
            .merge(self.routes.clone())
            .layer(middleware::from_fn_with_state(self.state.clone(), admission_middleware))
            .with_state(self.state.clone())
    }

    /// Binds the configured address and serves until [`shutdown`](Self::shutdown).
    pub async fn start(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| ServerError::Network(format!("Failed to bind {}: {e}", self.config.bind_address)))?;
        self.serve(listener, self.shutdown.clone()).await
    }

    /// Serves on an already bound listener until `shutdown` is cancelled.
    /// In-flight requests are allowed to finish.
    pub async fn serve(&self, listener: TcpListener, shutdown: CancellationToken) -> Result<(), ServerError> {
        let local = listener
            .local_addr()
            .map_err(|e| ServerError::Network(e.to_string()))?;
        info!("🌐 Gate server listening on http://{}", local);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| ServerError::Network(e.to_string()))?;

        info!("🛑 Gate server stopped accepting connections");
        Ok(())
    }

    /// Asks a running [`start`](Self::start) to finish gracefully.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
