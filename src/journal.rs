//! Lifecycle event journal
//!
//! Appends JSON lines (`timestamp`, `event`, `data`) to `journal.log` next to
//! the persisted stores. Enabled by default; `general.journal = false` turns
//! it off.

use crate::config::Config;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

pub const INSTALL_COMPLETED: &str = "install.completed";
pub const INSTALL_FAILED: &str = "install.failed";
pub const ACTIVATE_COMPLETED: &str = "activate.completed";
pub const ACTIVATE_FAILED: &str = "activate.failed";
pub const STORES_CLEARED: &str = "stores.cleared";

/// File-based journal that appends JSON lines
#[derive(Debug, Clone)]
pub struct Journal {
    enabled: bool,
    path: PathBuf,
}

impl Journal {
    /// Create a journal from config
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.journal,
            path: config.journal_path(),
        }
    }

    /// Journal writing to an explicit file
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            path: path.into(),
        }
    }

    /// Journal that records nothing
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            path: PathBuf::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record an event as a JSON line
    ///
    /// IO failures are logged and the event is dropped; the journal never
    /// fails a lifecycle phase.
    pub async fn record(&self, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize journal event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write journal {}: {}", self.path.display(), e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
