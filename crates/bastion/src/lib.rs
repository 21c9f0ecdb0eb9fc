//! # Bastion Server - Main Entry Point
//!
//! Health-gated application server. Subsystems publish severity-ranked
//! events, the derived application state decides which requests the
//! admission gate lets through, and maintenance tasks latch and drain
//! traffic under a cluster-wide lock.
//!
//! ## Quick Start
//!
//! ```bash
//! bastion                                   # reads ./config.toml
//! bastion --config /etc/bastion/node-a.toml
//! bastion --bind 0.0.0.0:8080 --log-level debug --auto-setup
//! bastion --json-logs
//! ```
//!
//! A missing configuration file is written out with every default filled in.
//!
//! SIGINT or SIGTERM moves the application to `STOPPING` and lets in-flight
//! requests finish. A second signal during shutdown exits immediately.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod setup;
mod signals;

pub use app::{Application, HTTP_SERVICE};
pub use cli::CliArgs;
pub use config::{AppConfig, LoggingSettings, ServerSettings};
pub use setup::MarkerFileSetup;

/// Main entry point for the Bastion server.
///
/// Parses arguments, loads configuration, initializes logging and runs the
/// application until shutdown.
///
/// Exits the process with status 1 if logging, startup or the run itself fails.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging settings come from the file, so load it once before the subscriber exists
    let config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();
    let mut logging = config.logging;
    if let Some(level) = &args.log_level {
        logging.level = level.clone();
    }

    if let Err(e) = logging::setup_logging(&logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}
