//! In-process cache storage

use crate::error::SwCacheResult;
use crate::net::{RequestKey, Response};
use crate::store::CacheStorage;
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryStore {
    name: String,
    entries: Vec<(RequestKey, Response)>,
}

/// Cache storage held entirely in memory
///
/// Used when embedding the worker and throughout the tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    stores: RwLock<Vec<MemoryStore>>,
}

impl MemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> SwCacheResult<()> {
        let mut stores = self.stores.write().await;
        if !stores.iter().any(|s| s.name == name) {
            stores.push(MemoryStore {
                name: name.to_string(),
                entries: Vec::new(),
            });
        }
        Ok(())
    }

    async fn has(&self, name: &str) -> SwCacheResult<bool> {
        Ok(self.stores.read().await.iter().any(|s| s.name == name))
    }

    async fn delete(&self, name: &str) -> SwCacheResult<bool> {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|s| s.name != name);
        Ok(stores.len() != before)
    }

    async fn names(&self) -> SwCacheResult<Vec<String>> {
        Ok(self
            .stores
            .read()
            .await
            .iter()
            .map(|s| s.name.clone())
            .collect())
    }

    async fn keys(&self, store: &str) -> SwCacheResult<Vec<RequestKey>> {
        Ok(self
            .stores
            .read()
            .await
            .iter()
            .find(|s| s.name == store)
            .map(|s| s.entries.iter().map(|(k, _)| k.clone()).collect())
            .unwrap_or_default())
    }

    async fn get(&self, store: &str, key: &RequestKey) -> SwCacheResult<Option<Response>> {
        Ok(self
            .stores
            .read()
            .await
            .iter()
            .find(|s| s.name == store)
            .and_then(|s| s.entries.iter().find(|(k, _)| k == key))
            .map(|(_, r)| r.clone()))
    }

    async fn put(&self, store: &str, key: &RequestKey, response: &Response) -> SwCacheResult<()> {
        let mut stores = self.stores.write().await;
        let idx = match stores.iter().position(|s| s.name == store) {
            Some(idx) => idx,
            None => {
                stores.push(MemoryStore {
                    name: store.to_string(),
                    entries: Vec::new(),
                });
                stores.len() - 1
            }
        };

        let entries = &mut stores[idx].entries;
        entries.retain(|(k, _)| k != key);
        entries.push((key.clone(), response.clone()));
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
