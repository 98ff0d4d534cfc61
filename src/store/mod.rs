//! Named persistent cache stores
//!
//! Three stores exist side by side:
//!
//! | Store | Name | Owner |
//! |-------|------|-------|
//! | Staging | fixed (`flutter-temp-cache`) | install phase |
//! | Manifest | fixed (`flutter-app-manifest`) | activate phase |
//! | Content | `<base>-<version>` | activate phase, router in steady state |
//!
//! Reads against a store that does not exist are misses, never errors: the
//! router may run while activation is still migrating entries.

pub mod disk;
pub mod manifest;
pub mod memory;

pub use disk::DiskStorage;
pub use manifest::ManifestEntry;
pub use memory::MemoryStorage;

use crate::error::SwCacheResult;
use crate::net::{RequestKey, Response};
use async_trait::async_trait;
use tracing::debug;

/// Abstract cache storage interface, addressed by store name and request identity
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the store if it does not exist yet
    async fn open(&self, name: &str) -> SwCacheResult<()>;

    /// Check whether a store exists
    async fn has(&self, name: &str) -> SwCacheResult<bool>;

    /// Delete a store and all its entries, returning whether it existed
    async fn delete(&self, name: &str) -> SwCacheResult<bool>;

    /// All store names, in creation order
    async fn names(&self) -> SwCacheResult<Vec<String>>;

    /// Entry keys of a store, in insertion order (empty if the store is missing)
    async fn keys(&self, store: &str) -> SwCacheResult<Vec<RequestKey>>;

    /// Look up an entry (None if the store or the entry is missing)
    async fn get(&self, store: &str, key: &RequestKey) -> SwCacheResult<Option<Response>>;

    /// Insert or replace an entry, creating the store if needed
    ///
    /// A replaced entry moves to the end of the insertion order.
    async fn put(&self, store: &str, key: &RequestKey, response: &Response) -> SwCacheResult<()>;

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;
}

/// Names of the three stores the lifecycle manages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNames {
    /// Prefix of every content store name
    pub base: String,
    /// Store populated at install time
    pub staging: String,
    /// Store holding the manifest entry
    pub manifest: String,
    /// Key of the manifest entry inside the manifest store
    pub manifest_key: RequestKey,
}

impl StoreNames {
    /// Content store name for a version
    pub fn content(&self, version: &str) -> String {
        format!("{}-{}", self.base, version)
    }

    /// Whether a store belongs to the content family (any version, or the bare base)
    pub fn is_content_store(&self, name: &str) -> bool {
        name.starts_with(&self.base)
    }
}

/// Copy every entry of `from` into `to`, preserving insertion order
///
/// Returns the number of entries copied; a missing source copies nothing.
pub async fn copy_entries(
    storage: &dyn CacheStorage,
    from: &str,
    to: &str,
) -> SwCacheResult<usize> {
    let keys = storage.keys(from).await?;
    let mut copied = 0;

    for key in keys {
        // An entry can vanish between keys() and get(); skip it
        if let Some(response) = storage.get(from, &key).await? {
            storage.put(to, &key, &response).await?;
            copied += 1;
        }
    }

    debug!("Copied {} entries from {} to {}", copied, from, to);
    Ok(copied)
}
