//! Worker state that outlives a single process
//!
//! A failed activation leaves the cache degraded until the next successful
//! install. The flag is kept in `worker.json` next to the persisted stores so
//! a worker resumed by a later command keeps passing requests through.

use crate::config::Config;
use crate::error::{SwCacheError, SwCacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Persisted flags of the installed worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerState {
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl WorkerState {
    pub fn degraded(reason: impl ToString) -> Self {
        Self {
            degraded: true,
            reason: Some(reason.to_string()),
            updated_at: Utc::now(),
        }
    }
}

/// Location of the state file; `None` keeps state in memory only
#[derive(Debug, Clone, Default)]
pub struct StateFile {
    path: Option<PathBuf>,
}

impl StateFile {
    /// State file under the configured storage directory
    pub fn new(config: &Config) -> Self {
        Self::at(config.state_path())
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// State that is never written
    pub fn ephemeral() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load the persisted state
    ///
    /// A missing file means a healthy worker. An unreadable file is reported
    /// and treated as degraded, so nothing is cached from a state we cannot
    /// trust.
    pub async fn load(&self) -> SwCacheResult<Option<WorkerState>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };

        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SwCacheError::io(
                    format!("reading worker state from {}", path.display()),
                    e,
                ))
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!("Ignoring corrupt worker state {}: {}", path.display(), e);
                Ok(Some(WorkerState::degraded(format!("corrupt state file: {}", e))))
            }
        }
    }

    /// Whether the persisted state marks the cache as degraded
    pub async fn is_degraded(&self) -> SwCacheResult<bool> {
        Ok(self.load().await?.is_some_and(|s| s.degraded))
    }

    /// Persist a degraded marker
    pub async fn mark_degraded(&self, reason: impl ToString) -> SwCacheResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let state = WorkerState::degraded(reason);
        let content = serde_json::to_string_pretty(&state)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SwCacheError::io("creating state directory", e))?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .await
            .map_err(|e| SwCacheError::io(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| SwCacheError::io(format!("replacing {}", path.display()), e))?;

        debug!("Marked cache degraded in {}", path.display());
        Ok(())
    }

    /// Drop the persisted state, returning the worker to healthy
    pub async fn clear(&self) -> SwCacheResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!("Cleared worker state {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SwCacheError::io(
                format!("removing {}", path.display()),
                e,
            )),
        }
    }
}
