//! First-run setup detection backed by a marker file.

use bastion_event_system::{HealthConfig, SetupStatus};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Reports setup as complete once the marker file exists.
///
/// The file is checked once at construction and the answer is cached, so
/// state queries never touch the filesystem. Clones share the cached answer.
/// Without a configured marker setup is always complete.
#[derive(Debug, Clone)]
pub struct MarkerFileSetup {
    marker: Option<PathBuf>,
    complete: Arc<AtomicBool>,
}

impl Default for MarkerFileSetup {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MarkerFileSetup {
    pub fn new(marker: Option<PathBuf>) -> Self {
        let complete = marker.as_ref().map_or(true, |marker| marker.exists());
        Self {
            marker,
            complete: Arc::new(AtomicBool::new(complete)),
        }
    }

    pub fn from_config(config: &HealthConfig) -> Self {
        Self::new(config.setup_marker.as_ref().map(PathBuf::from))
    }

    pub fn marker(&self) -> Option<&Path> {
        self.marker.as_deref()
    }

    /// Writes the marker file if it is missing. Returns true if it was created.
    pub async fn mark_complete(&self) -> std::io::Result<bool> {
        let Some(marker) = &self.marker else {
            return Ok(false);
        };
        if tokio::fs::try_exists(marker).await? {
            self.complete.store(true, Ordering::Release);
            return Ok(false);
        }
        if let Some(parent) = marker.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(marker, b"setup complete\n").await?;
        self.complete.store(true, Ordering::Release);
        info!("📝 Setup marker written: {}", marker.display());
        Ok(true)
    }
}

impl SetupStatus for MarkerFileSetup {
    fn is_setup_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }
}
