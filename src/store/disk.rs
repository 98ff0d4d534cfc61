//! Persistent cache storage on the local filesystem
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<store digest>/store.json        real store name, creation time, next sequence
//! <root>/<store digest>/<key digest>.json entry metadata (key, status, headers, body digest)
//! <root>/<store digest>/<key digest>.body response body
//! ```
//!
//! Store names and request URLs are arbitrary strings, so both are mapped to
//! directory and file names through a truncated SHA-256 digest. The entry
//! metadata file is written last and is the commit point of a `put`.

use crate::error::{SwCacheError, SwCacheResult};
use crate::net::{RequestKey, Response};
use crate::store::CacheStorage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

const STORE_DESCRIPTOR: &str = "store.json";

/// Descriptor written once per store directory
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDescriptor {
    name: String,
    created_at: DateTime<Utc>,
    next_seq: u64,
}

/// Metadata of one cached entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    key: RequestKey,
    seq: u64,
    url: String,
    status: u16,
    headers: Vec<(String, String)>,
    body_sha256: String,
    body_len: u64,
    stored_at: DateTime<Utc>,
}

/// Cache storage persisted under a directory
pub struct DiskStorage {
    root: PathBuf,
    lock: Mutex<()>,
}

/// Hash a string with SHA256, returning the first 32 hex chars
fn digest(value: &str) -> String {
    let hash = Sha256::digest(value.as_bytes());
    hex::encode(&hash[..16])
}

fn body_digest(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

impl DiskStorage {
    /// Create a storage rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    /// Root directory of the storage
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, name: &str) -> PathBuf {
        self.root.join(digest(name))
    }

    fn meta_path(&self, store: &str, key: &RequestKey) -> PathBuf {
        self.store_dir(store)
            .join(format!("{}.json", digest(key.url())))
    }

    fn body_path(&self, store: &str, key: &RequestKey) -> PathBuf {
        self.store_dir(store)
            .join(format!("{}.body", digest(key.url())))
    }

    async fn read_descriptor(&self, dir: &Path) -> Option<StoreDescriptor> {
        let content = fs::read_to_string(dir.join(STORE_DESCRIPTOR)).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    async fn write_json<T: Serialize>(
        &self,
        operation: &'static str,
        store: &str,
        path: &Path,
        value: &T,
    ) -> SwCacheResult<()> {
        let content =
            serde_json::to_vec_pretty(value).map_err(|e| SwCacheError::store(operation, store, e))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, content)
            .await
            .map_err(|e| SwCacheError::store(operation, store, e))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| SwCacheError::store(operation, store, e))
    }

    /// Create the store directory if missing and return its descriptor
    async fn ensure_store(&self, name: &str) -> SwCacheResult<StoreDescriptor> {
        let dir = self.store_dir(name);
        if let Some(descriptor) = self.read_descriptor(&dir).await {
            return Ok(descriptor);
        }

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SwCacheError::store("open", name, e))?;

        let descriptor = StoreDescriptor {
            name: name.to_string(),
            created_at: Utc::now(),
            next_seq: 0,
        };
        self.write_json("open", name, &dir.join(STORE_DESCRIPTOR), &descriptor)
            .await?;
        debug!("Created store {} at {}", name, dir.display());
        Ok(descriptor)
    }

    async fn read_entries(&self, store: &str) -> SwCacheResult<Vec<EntryMeta>> {
        let dir = self.store_dir(store);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(SwCacheError::store("keys", store, e)),
        };

        let mut metas = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SwCacheError::store("keys", store, e))?
        {
            let path = entry.path();
            let is_meta = path.extension().is_some_and(|ext| ext == "json")
                && path.file_name().is_some_and(|n| n != STORE_DESCRIPTOR);
            if !is_meta {
                continue;
            }

            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| SwCacheError::store("keys", store, e))?;
            let meta: EntryMeta = serde_json::from_str(&content)
                .map_err(|e| SwCacheError::store("keys", store, e))?;
            metas.push(meta);
        }

        metas.sort_by_key(|m| m.seq);
        Ok(metas)
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> SwCacheResult<()> {
        let _guard = self.lock.lock().await;
        self.ensure_store(name).await.map(|_| ())
    }

    async fn has(&self, name: &str) -> SwCacheResult<bool> {
        let _guard = self.lock.lock().await;
        Ok(self.read_descriptor(&self.store_dir(name)).await.is_some())
    }

    async fn delete(&self, name: &str) -> SwCacheResult<bool> {
        let _guard = self.lock.lock().await;
        let dir = self.store_dir(name);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!("Deleted store {}", name);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SwCacheError::store("delete", name, e)),
        }
    }

    async fn names(&self) -> SwCacheResult<Vec<String>> {
        let _guard = self.lock.lock().await;
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(SwCacheError::io("listing cache stores", e)),
        };

        let mut descriptors = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SwCacheError::io("listing cache stores", e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }
            let path = entry.path();
            // Directories without a readable descriptor are half-created stores
            if let Some(descriptor) = self.read_descriptor(&path).await {
                descriptors.push(descriptor);
            }
        }

        descriptors.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(descriptors.into_iter().map(|d| d.name).collect())
    }

    async fn keys(&self, store: &str) -> SwCacheResult<Vec<RequestKey>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_entries(store)
            .await?
            .into_iter()
            .map(|m| m.key)
            .collect())
    }

    async fn get(&self, store: &str, key: &RequestKey) -> SwCacheResult<Option<Response>> {
        let _guard = self.lock.lock().await;

        let content = match fs::read_to_string(self.meta_path(store, key)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SwCacheError::store("match", store, e)),
        };
        let meta: EntryMeta =
            serde_json::from_str(&content).map_err(|e| SwCacheError::store("match", store, e))?;

        let body = fs::read(self.body_path(store, key))
            .await
            .map_err(|e| SwCacheError::store("match", store, e))?;
        if body_digest(&body) != meta.body_sha256 {
            return Err(SwCacheError::store(
                "match",
                store,
                format!("body digest mismatch for {}", key),
            ));
        }

        Ok(Some(Response {
            url: meta.url,
            status: meta.status,
            headers: meta.headers,
            body,
        }))
    }

    async fn put(&self, store: &str, key: &RequestKey, response: &Response) -> SwCacheResult<()> {
        let _guard = self.lock.lock().await;
        let mut descriptor = self.ensure_store(store).await?;

        fs::write(self.body_path(store, key), &response.body)
            .await
            .map_err(|e| SwCacheError::store("put", store, e))?;

        let meta = EntryMeta {
            key: key.clone(),
            seq: descriptor.next_seq,
            url: response.url.clone(),
            status: response.status,
            headers: response.headers.clone(),
            body_sha256: body_digest(&response.body),
            body_len: response.body.len() as u64,
            stored_at: Utc::now(),
        };
        self.write_json("put", store, &self.meta_path(store, key), &meta)
            .await?;

        descriptor.next_seq += 1;
        self.write_json(
            "put",
            store,
            &self.store_dir(store).join(STORE_DESCRIPTOR),
            &descriptor,
        )
        .await
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}
