//! Logging system setup and configuration.

use crate::config::LoggingSettings;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Picks the log destination: the configured file (appended to) or stdout.
/// The flag says whether ANSI colours are appropriate.
fn log_writer(config: &LoggingSettings) -> std::io::Result<(BoxMakeWriter, bool)> {
    match &config.file_path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Ok((BoxMakeWriter::new(Arc::new(file)), false))
        }
        None => Ok((BoxMakeWriter::new(std::io::stdout), true)),
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` wins over the configured level. JSON output is used when
/// either the config or `json_format` asks for it.
pub fn setup_logging(config: &LoggingSettings, json_format: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = config.level.as_str();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let (writer, ansi) = log_writer(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    if json_format || config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(ansi)
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    info!("🔧 Logging initialized with level: {}", log_level);
    if let Some(path) = &config.file_path {
        info!("📝 Writing logs to {}", path);
    }
    Ok(())
}

/// Displays the startup banner.
pub fn display_banner() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("UNK");
    info!("╔══════════════════════════════════════════╗");
    info!("║            🏰 BASTION SERVER 🏰          ║");
    info!("║                 v{:<8}                ║", version);
    info!("║                                          ║");
    info!("║  🩺 Severity-ranked health events        ║");
    info!("║  🚧 State-driven admission gate          ║");
    info!("║  🔒 Latch, drain and cluster locks       ║");
    info!("╚══════════════════════════════════════════╝");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_path_selects_file_writer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bastion.log");
        let config = LoggingSettings {
            file_path: Some(path.to_string_lossy().to_string()),
            ..LoggingSettings::default()
        };

        let (_writer, ansi) = log_writer(&config).unwrap();
        assert!(!ansi);
        assert!(path.exists());
    }

    #[test]
    fn test_stdout_is_default_writer() {
        let (_writer, ansi) = log_writer(&LoggingSettings::default()).unwrap();
        assert!(ansi);
    }

    #[test]
    fn test_unwritable_log_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = LoggingSettings {
            file_path: Some(dir.path().join("missing").join("bastion.log").to_string_lossy().to_string()),
            ..LoggingSettings::default()
        };
        assert!(log_writer(&config).is_err());
    }
}
