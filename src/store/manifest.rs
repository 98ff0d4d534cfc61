//! Manifest entry: the version the content store currently reflects

use crate::error::{SwCacheError, SwCacheResult};
use crate::net::Response;
use crate::store::{CacheStorage, StoreNames};
use serde::{Deserialize, Serialize};

/// Single record kept under the manifest key
///
/// Absence means no activation has completed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub version: String,
}

impl ManifestEntry {
    /// Create an entry for a version
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// Read the entry from the manifest store
    pub async fn load(
        storage: &dyn CacheStorage,
        names: &StoreNames,
    ) -> SwCacheResult<Option<Self>> {
        let Some(response) = storage.get(&names.manifest, &names.manifest_key).await? else {
            return Ok(None);
        };

        let entry: Self = serde_json::from_slice(&response.body)
            .map_err(|e| SwCacheError::store("read manifest", &names.manifest, e))?;
        Ok(Some(entry))
    }

    /// Write (or overwrite) the entry
    pub async fn save(&self, storage: &dyn CacheStorage, names: &StoreNames) -> SwCacheResult<()> {
        let body = serde_json::to_vec(self)?;
        let response = Response::new(names.manifest_key.url(), 200, body)
            .with_header("Content-Type", "application/json");
        storage
            .put(&names.manifest, &names.manifest_key, &response)
            .await
    }
}
