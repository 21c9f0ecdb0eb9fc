//! Main application logic and lifecycle management.
//!
//! `Application` is the single wiring point: every health, gate and
//! coordination service is built here once and handed to its collaborators.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    setup::MarkerFileSetup,
    signals::{wait_for_shutdown_signal, wait_for_shutdown_signal_silent},
};
use bastion_event_system::{create_health_system, HealthSystem};
use cluster_coordination::{
    BootstrapLock, CoordinationError, LatchableService, LocalLockProvider, LockProvider, MaintenanceRunner, WorkTracker,
};
use gate_server::{GateServer, ServerError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Name of the work tracker guarding admitted HTTP requests.
pub const HTTP_SERVICE: &str = "http";

/// Main application struct.
///
/// Owns the configuration and the top-level instance of every service:
///
/// * **Health**: event system, state machine and startup progress
/// * **Gate server**: HTTP front door with the admission gate
/// * **Coordination**: lock provider, bootstrap lock and maintenance runner
pub struct Application {
    config: AppConfig,
    health: HealthSystem,
    setup: MarkerFileSetup,
    server: Arc<GateServer>,
    http_work: WorkTracker,
    bootstrap: BootstrapLock,
    maintenance: Arc<MaintenanceRunner>,
}

impl Application {
    /// Creates the application from command-line arguments.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Build every service
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(bind_address) = args.bind_address {
            config.server.bind_address = bind_address;
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if args.auto_setup {
            config.health.auto_setup = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        } else {
            info!("✅ Configuration loaded and validated successfully");
        }

        display_banner();

        let app = Self::from_config(config)?;
        info!("📂 Config: {}", args.config_path.display());
        Ok(app)
    }

    /// Builds every service from an already validated configuration.
    pub fn from_config(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let setup = MarkerFileSetup::from_config(&config.health);
        let health = create_health_system(config.health.clone(), Arc::new(setup.clone()));

        let http_work = WorkTracker::new(HTTP_SERVICE);
        let server = GateServer::new(config.to_server_config()?, health.clone())?.with_work_tracker(http_work.clone());

        let provider: Arc<dyn LockProvider> = Arc::new(LocalLockProvider::new(
            config.maintenance.lock_namespace.clone(),
            config.maintenance.lock_timeout(),
        ));
        let bootstrap = BootstrapLock::new(provider.clone(), config.maintenance.failure_precedence);
        let maintenance = Arc::new(MaintenanceRunner::new(&health, provider, config.maintenance.clone()));

        Ok(Self {
            config,
            health,
            setup,
            server: Arc::new(server),
            http_work,
            bootstrap,
            maintenance,
        })
    }

    pub fn health(&self) -> &HealthSystem {
        &self.health
    }

    pub fn maintenance(&self) -> &Arc<MaintenanceRunner> {
        &self.maintenance
    }

    /// Runs `operation` as a maintenance task with HTTP traffic latched and drained.
    pub async fn run_maintenance<F, Fut, T>(&self, task: &str, operation: F) -> cluster_coordination::Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = cluster_coordination::Result<T>>,
    {
        let services: [Arc<dyn LatchableService>; 1] = [Arc::new(self.http_work.clone())];
        self.maintenance.run(task, &services, operation).await
    }

    /// Runs the application until a shutdown signal arrives.
    ///
    /// Bootstraps under the cluster-wide lock, starts serving, marks the
    /// application running and then waits. On shutdown the state moves to
    /// `STOPPING` first so the gate turns new requests away while the server
    /// drains.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Bastion Server Application");
        self.log_configuration_summary();

        self.health.progress.advance_with_message(10, "Configuration loaded");
        self.bootstrap().await?;
        self.health.progress.advance_with_message(60, "Bootstrap complete");

        let mut server_handle: JoinHandle<Result<(), ServerError>> = {
            let server = self.server.clone();
            tokio::spawn(async move { server.start().await })
        };

        self.health.state.mark_running();
        self.health.progress.advance_with_message(100, "Ready");

        let monitoring_handle = self.spawn_monitor();

        info!("✅ Bastion Server is now running!");
        info!("🎮 Ready to accept connections on {}", self.config.server.bind_address);
        info!(
            "🔍 Health monitoring active - stats every {} seconds",
            self.config.server.monitor_interval_secs
        );
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        tokio::select! {
            signal = wait_for_shutdown_signal() => signal?,
            served = &mut server_handle => {
                monitoring_handle.abort();
                self.health.state.mark_stopping();
                return match served {
                    Ok(Ok(())) => Err("Gate server stopped unexpectedly".into()),
                    Ok(Err(e)) => Err(e.into()),
                    Err(e) => Err(e.into()),
                };
            }
        }

        tokio::spawn(async move {
            if let Err(e) = wait_for_shutdown_signal_silent().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");
        self.health.state.mark_stopping();
        monitoring_handle.abort();

        info!("⏳ Waiting for in-flight requests to complete...");
        self.server.shutdown();
        let timeout = Duration::from_secs(self.config.server.shutdown_timeout_secs);
        match tokio::time::timeout(timeout, server_handle).await {
            Ok(Ok(Ok(()))) => info!("✅ Gate server completed gracefully"),
            Ok(Ok(Err(e))) => error!("❌ Gate server error during shutdown: {}", e),
            Ok(Err(e)) => error!("❌ Gate server task failed: {}", e),
            Err(_) => warn!(
                "⏰ Gate server did not stop within {}s, {} request(s) still in flight",
                timeout.as_secs(),
                self.http_work.outstanding()
            ),
        }

        log_final_statistics(&self.health, &self.server);

        info!("✅ Bastion Server shutdown complete");
        Ok(())
    }

    /// One-time startup work, serialized across nodes.
    async fn bootstrap(&self) -> Result<(), CoordinationError> {
        let setup = self.setup.clone();
        let auto_setup = self.config.health.auto_setup;

        self.bootstrap
            .run_once(|| async move {
                if auto_setup {
                    setup.mark_complete().await.map_err(CoordinationError::operation)?;
                }
                Ok::<(), CoordinationError>(())
            })
            .await
    }

    fn spawn_monitor(&self) -> JoinHandle<()> {
        let health = self.health.clone();
        let server = self.server.clone();
        let http_work = self.http_work.clone();
        let period = Duration::from_secs(self.config.server.monitor_interval_secs);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            let mut last_rejected = 0u64;

            loop {
                interval.tick().await;

                let stats = server.gate_stats();
                let rejected_this_period = stats.rejected - last_rejected;
                last_rejected = stats.rejected;

                info!(
                    "📊 System Health - {} | {} active event(s) | {} request(s) in flight",
                    health.state.get_state(),
                    health.events.get_events().len(),
                    http_work.outstanding()
                );

                if rejected_this_period > 0 {
                    warn!("🚫 {} request(s) turned away this period", rejected_this_period);
                }
            }
        })
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!("  🩺 Severity order: {}", self.config.health.severity_order.join(" > "));
        info!(
            "  🚧 Gate: {} | {} ignore pattern(s) | bypass {}",
            if self.config.gate.enabled { "enabled" } else { "disabled" },
            self.config.gate.ignore_patterns.len(),
            if self.config.gate.bypass_secret.is_some() { "configured" } else { "off" }
        );
        info!(
            "  🔒 Locks: namespace '{}' | acquire timeout {}s",
            self.config.maintenance.lock_namespace, self.config.maintenance.lock_timeout_secs
        );
        info!(
            "  ⏱️ Drain: {}s | force drain: {}s",
            self.config.maintenance.drain.drain_secs, self.config.maintenance.drain.force_drain_secs
        );
    }
}

/// Logs final statistics during shutdown.
fn log_final_statistics(health: &HealthSystem, server: &GateServer) {
    let events = health.events.get_stats();
    let gate = server.gate_stats();

    info!("📊 Final Statistics:");
    info!("  - Events published: {}", events.events_published);
    info!("  - Events discarded: {}", events.events_discarded);
    info!("  - Events still active: {}", health.events.get_events().len());
    info!(
        "  - Requests: {} allowed, {} bypassed, {} ignored, {} rejected",
        gate.allowed, gate.bypassed, gate.ignored, gate.rejected
    );
}
