//! Scripted collaborators for unit tests

use crate::error::{SwCacheError, SwCacheResult};
use crate::lifecycle::WorkerHost;
use crate::net::{CacheMode, Method, Network, Request, RequestKey, Response};
use crate::store::{CacheStorage, MemoryStorage};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Clone)]
enum Scripted {
    Respond(Response),
    Fail,
}

/// Network whose answers are scripted per URL
///
/// Unscripted URLs fail like an offline network.
#[derive(Default)]
pub struct FakeNetwork {
    script: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<(String, Method, CacheMode)>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, response: Response) {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::Respond(response));
    }

    /// Respond 200 with `body` for `url`
    pub fn serve(&self, url: &str, body: &str) {
        self.respond(url, Response::new(url, 200, body));
    }

    pub fn fail(&self, url: &str) {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::Fail);
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _, _)| u == url)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn cache_modes(&self, url: &str) -> Vec<CacheMode> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _, _)| u == url)
            .map(|(_, _, mode)| *mode)
            .collect()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request, cache: CacheMode) -> SwCacheResult<Response> {
        self.calls
            .lock()
            .unwrap()
            .push((request.url.clone(), request.method.clone(), cache));

        let scripted = self.script.lock().unwrap().get(&request.url).cloned();
        match scripted {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail) | None => Err(SwCacheError::network(&request.url, "offline")),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Host that records the capabilities the worker invoked, in order
#[derive(Default)]
pub struct RecordingHost {
    events: Mutex<Vec<&'static str>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| **e == event)
            .count()
    }
}

#[async_trait]
impl WorkerHost for RecordingHost {
    async fn skip_waiting(&self) {
        self.events.lock().unwrap().push("skip_waiting");
    }

    async fn claim_clients(&self) {
        self.events.lock().unwrap().push("claim_clients");
    }
}

/// Memory storage that fails chosen operations on chosen stores
#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    failing: Mutex<HashSet<(&'static str, String)>>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }

    /// Make `operation` ("put", "match", "delete", ...) fail on `store`
    pub fn fail_on(&self, operation: &'static str, store: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert((operation, store.to_string()));
    }

    fn check(&self, operation: &'static str, store: &str) -> SwCacheResult<()> {
        if self
            .failing
            .lock()
            .unwrap()
            .contains(&(operation, store.to_string()))
        {
            return Err(SwCacheError::store(operation, store, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> SwCacheResult<()> {
        self.check("open", name)?;
        self.inner.open(name).await
    }

    async fn has(&self, name: &str) -> SwCacheResult<bool> {
        self.inner.has(name).await
    }

    async fn delete(&self, name: &str) -> SwCacheResult<bool> {
        self.check("delete", name)?;
        self.inner.delete(name).await
    }

    async fn names(&self) -> SwCacheResult<Vec<String>> {
        self.inner.names().await
    }

    async fn keys(&self, store: &str) -> SwCacheResult<Vec<RequestKey>> {
        self.check("keys", store)?;
        self.inner.keys(store).await
    }

    async fn get(&self, store: &str, key: &RequestKey) -> SwCacheResult<Option<Response>> {
        self.check("match", store)?;
        self.inner.get(store, key).await
    }

    async fn put(&self, store: &str, key: &RequestKey, response: &Response) -> SwCacheResult<()> {
        self.check("put", store)?;
        self.inner.put(store, key, response).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}
