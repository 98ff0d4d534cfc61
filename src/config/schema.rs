//! Configuration schema for swcache
//!
//! Configuration is stored at `~/.config/swcache/config.toml`

use crate::config::ConfigManager;
use crate::error::{SwCacheError, SwCacheResult};
use crate::lifecycle::WorkerSettings;
use crate::net::{AppOrigin, RequestKey};
use crate::store::StoreNames;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Deployed application
    pub app: AppConfig,

    /// Cache store naming
    pub cache: CacheConfig,

    /// Version descriptor
    pub version: VersionConfig,

    /// Application shell assets
    pub assets: AssetsConfig,

    /// HTTP client settings
    pub network: NetworkConfig,

    /// Persistent storage location
    pub storage: StorageConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Record lifecycle events in the journal
    pub journal: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            journal: true,
        }
    }
}

/// Deployed application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scope URL every relative path resolves against
    pub origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080/".to_string(),
        }
    }
}

/// Cache store names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Content store base; the active store is `<base_name>-<version>`
    pub base_name: String,

    /// Store filled during install
    pub staging_name: String,

    /// Store holding the version record
    pub manifest_name: String,

    /// Path of the version record inside the manifest store
    pub manifest_key: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_name: "flutter-app-cache".to_string(),
            staging_name: "flutter-temp-cache".to_string(),
            manifest_name: "flutter-app-manifest".to_string(),
            manifest_key: "manifest".to_string(),
        }
    }
}

/// Version descriptor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
    /// Descriptor location, relative to the origin
    pub url: String,

    /// Append `+<build_number>` to the version token
    pub include_build_number: bool,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            url: "version.json".to_string(),
            include_build_number: false,
        }
    }
}

/// Application shell assets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Assets pre-fetched at install time
    pub core: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            core: [
                "index.html",
                "main.dart.js",
                "flutter.js",
                "favicon.png",
                "manifest.json",
                "assets/AssetManifest.json",
                "assets/FontManifest.json",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Whole-request timeout
    pub timeout_secs: u64,

    /// Largest response body accepted
    pub max_body_mb: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_body_mb: 64,
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the persisted stores (default: state dir)
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Check settings that would break the lifecycle
    pub fn validate(&self) -> SwCacheResult<()> {
        if !matches!(self.general.log_format.as_str(), "text" | "json") {
            return Err(SwCacheError::SettingsInvalid(format!(
                "general.log_format must be \"text\" or \"json\", got \"{}\"",
                self.general.log_format
            )));
        }

        let cache = &self.cache;
        let names = [
            ("cache.base_name", &cache.base_name),
            ("cache.staging_name", &cache.staging_name),
            ("cache.manifest_name", &cache.manifest_name),
            ("cache.manifest_key", &cache.manifest_key),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                return Err(SwCacheError::SettingsInvalid(format!("{} is empty", key)));
            }
        }

        if cache.staging_name == cache.manifest_name {
            return Err(SwCacheError::SettingsInvalid(
                "cache.staging_name and cache.manifest_name must differ".to_string(),
            ));
        }
        // A version change deletes every store prefixed by the base name
        for (key, value) in [
            ("cache.staging_name", &cache.staging_name),
            ("cache.manifest_name", &cache.manifest_name),
        ] {
            if value.starts_with(&cache.base_name) {
                return Err(SwCacheError::SettingsInvalid(format!(
                    "{} \"{}\" starts with cache.base_name \"{}\"",
                    key, value, cache.base_name
                )));
            }
        }

        if self.version.url.trim().is_empty() {
            return Err(SwCacheError::SettingsInvalid("version.url is empty".to_string()));
        }
        if self.network.timeout_secs == 0 {
            return Err(SwCacheError::SettingsInvalid(
                "network.timeout_secs must be positive".to_string(),
            ));
        }
        if self.network.max_body_mb == 0 {
            return Err(SwCacheError::SettingsInvalid(
                "network.max_body_mb must be positive".to_string(),
            ));
        }

        AppOrigin::parse(&self.app.origin)?;
        Ok(())
    }

    /// Parsed application origin
    pub fn origin(&self) -> SwCacheResult<AppOrigin> {
        AppOrigin::parse(&self.app.origin)
    }

    /// Resolve a path or URL against the origin
    pub fn resolve(&self, path: &str) -> SwCacheResult<String> {
        self.origin()?.resolve(path)
    }

    /// Validate and resolve everything the lifecycle needs
    pub fn worker_settings(&self) -> SwCacheResult<WorkerSettings> {
        self.validate()?;
        let origin = self.origin()?;

        let mut seen = HashSet::new();
        let mut core_assets = Vec::with_capacity(self.assets.core.len());
        for asset in &self.assets.core {
            let url = origin.resolve(asset)?;
            // addAll rejects a batch that names the same request twice
            if !seen.insert(RequestKey::new(&url)) {
                return Err(SwCacheError::SettingsInvalid(format!(
                    "assets.core lists {} more than once",
                    url
                )));
            }
            core_assets.push(url);
        }

        Ok(WorkerSettings {
            names: StoreNames {
                base: self.cache.base_name.clone(),
                staging: self.cache.staging_name.clone(),
                manifest: self.cache.manifest_name.clone(),
                manifest_key: RequestKey::new(&origin.resolve(&self.cache.manifest_key)?),
            },
            version_url: origin.resolve(&self.version.url)?,
            include_build_number: self.version.include_build_number,
            core_assets,
        })
    }

    /// Directory holding the persisted stores
    pub fn storage_dir(&self) -> PathBuf {
        self.storage
            .dir
            .clone()
            .unwrap_or_else(ConfigManager::default_storage_dir)
    }

    /// Journal file, kept next to the stores it describes
    pub fn journal_path(&self) -> PathBuf {
        self.storage_dir().join("journal.log")
    }

    /// Persisted worker state, next to the stores
    pub fn state_path(&self) -> PathBuf {
        self.storage_dir().join("worker.json")
    }
}
