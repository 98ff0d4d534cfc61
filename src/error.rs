//! Error types for swcache
//!
//! All modules use `SwCacheResult<T>` as their return type.

use crate::lifecycle::WorkerPhase;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for swcache operations
pub type SwCacheResult<T> = Result<T, SwCacheError>;

/// All errors that can occur in swcache
#[derive(Error, Debug)]
pub enum SwCacheError {
    // Lifecycle errors
    #[error("Failed to resolve version from {url}: {reason}")]
    VersionFetch { url: String, reason: String },

    #[error("Cache store operation failed: {operation} on '{store}': {reason}")]
    StoreOperation {
        operation: &'static str,
        store: String,
        reason: String,
    },

    #[error("Pre-fetch of {url} returned HTTP {status}")]
    PrefetchStatus { url: String, status: u16 },

    #[error("Cannot {event} while worker is {phase}")]
    InvalidTransition {
        phase: WorkerPhase,
        event: &'static str,
    },

    // Network errors
    #[error("Network request failed: {url}: {reason}")]
    NetworkFetch { url: String, reason: String },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid cache settings: {0}")]
    SettingsInvalid(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl SwCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a store operation error
    pub fn store(operation: &'static str, store: impl Into<String>, reason: impl ToString) -> Self {
        Self::StoreOperation {
            operation,
            store: store.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a network fetch error
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::NetworkFetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::VersionFetch { .. } => {
                Some("Check that version.json is published next to the app; caches were cleared and requests go to the network until the next activation")
            }
            Self::PrefetchStatus { .. } => Some("Check [assets].core against the deployed files"),
            Self::InvalidTransition { .. } => Some("Run: swcache update"),
            Self::SettingsInvalid(_) | Self::ConfigInvalid { .. } => {
                Some("Run: swcache config show")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SwCacheError::store("put", "flutter-app-cache-1.0.0", "disk full");
        assert_eq!(
            err.to_string(),
            "Cache store operation failed: put on 'flutter-app-cache-1.0.0': disk full"
        );
    }

    #[test]
    fn error_hint() {
        let err = SwCacheError::PrefetchStatus {
            url: "http://localhost/main.dart.js".to_string(),
            status: 404,
        };
        assert_eq!(err.hint(), Some("Check [assets].core against the deployed files"));
        assert!(SwCacheError::Internal("x".to_string()).hint().is_none());
    }

    #[test]
    fn transition_error_names_phase() {
        let err = SwCacheError::InvalidTransition {
            phase: WorkerPhase::Installing,
            event: "activate",
        };
        assert_eq!(err.to_string(), "Cannot activate while worker is installing");
    }
}
