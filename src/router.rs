//! Request routing for intercepted fetches
//!
//! | Request | Strategy |
//! |---------|----------|
//! | non-GET | not intercepted |
//! | GET navigation, or path ending in `.html` | network first, cache fallback |
//! | any other GET | cache first, network fill |
//!
//! Cache writes happen in a spawned task; the caller gets its response
//! without waiting for them, and write failures only produce a warning.

use crate::error::SwCacheResult;
use crate::net::{CacheMode, Method, Network, Request, RequestKey, RequestMode, Response};
use crate::store::CacheStorage;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Fetch strategy chosen for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Leave the request to the host
    PassThrough,
    /// Pages: fresh when online, cached when offline
    NetworkFirst,
    /// Static assets: cached copy wins
    CacheFirst,
}

/// Pick the strategy for a request
pub fn classify(request: &Request) -> Route {
    if request.method != Method::Get {
        return Route::PassThrough;
    }
    if request.mode == RequestMode::Navigate {
        return Route::NetworkFirst;
    }

    match request.path() {
        Ok(path) if path.ends_with(".html") => Route::NetworkFirst,
        Ok(_) => Route::CacheFirst,
        Err(e) => {
            debug!("Not intercepting {}: {}", request.url, e);
            Route::PassThrough
        }
    }
}

/// The content store requests are served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveCache {
    /// No activation has completed in this worker; the bare base store is used
    Pending { store: String },
    /// Activation completed for `version`
    Ready { version: String, store: String },
    /// Activation failed and the stores were discarded; everything passes through
    Degraded,
}

impl ActiveCache {
    /// Name of the store to read and fill, if any
    pub fn store(&self) -> Option<&str> {
        match self {
            Self::Pending { store } | Self::Ready { store, .. } => Some(store),
            Self::Degraded => None,
        }
    }

    /// Version the active store reflects, if activation completed
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Ready { version, .. } => Some(version),
            _ => None,
        }
    }
}

/// Where a routed response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
    /// Network failed and nothing was cached
    Unresolved,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Network => write!(f, "network"),
            Self::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// A response produced by the router
#[derive(Debug)]
pub struct Routed {
    pub response: Option<Response>,
    pub source: ResponseSource,
    cache_fill: Option<JoinHandle<()>>,
}

impl Routed {
    fn new(response: Option<Response>, source: ResponseSource) -> Self {
        Self {
            response,
            source,
            cache_fill: None,
        }
    }

    /// Whether a background cache write was started
    pub fn has_cache_fill(&self) -> bool {
        self.cache_fill.is_some()
    }

    /// Wait for the background cache write, if one was started
    ///
    /// Never required for correctness; used before a process exits.
    pub async fn settle(&mut self) {
        if let Some(fill) = self.cache_fill.take() {
            if let Err(e) = fill.await {
                warn!("Cache fill task failed: {}", e);
            }
        }
    }
}

/// Outcome of intercepting a request
#[derive(Debug)]
pub enum FetchDisposition {
    /// Not intercepted: the host performs the request itself
    PassThrough,
    /// The router supplies the response
    Respond(Routed),
}

impl FetchDisposition {
    /// The routed response, unless the request passed through
    pub fn routed(self) -> Option<Routed> {
        match self {
            Self::PassThrough => None,
            Self::Respond(routed) => Some(routed),
        }
    }
}

/// Serves intercepted GET requests from the active content store
#[derive(Clone)]
pub struct RequestRouter {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    active: Arc<RwLock<ActiveCache>>,
}

impl RequestRouter {
    /// Create a router reading the active store from shared state
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        active: Arc<RwLock<ActiveCache>>,
    ) -> Self {
        Self {
            storage,
            network,
            active,
        }
    }

    /// Route one intercepted request
    ///
    /// Errors only when an asset is neither cached nor reachable.
    pub async fn route(&self, request: Request) -> SwCacheResult<FetchDisposition> {
        let route = classify(&request);
        if route == Route::PassThrough {
            return Ok(FetchDisposition::PassThrough);
        }

        let store = match self.active.read().await.store() {
            Some(store) => store.to_string(),
            None => {
                debug!("Cache degraded, passing {} through", request.url);
                return Ok(FetchDisposition::PassThrough);
            }
        };

        let routed = match route {
            Route::NetworkFirst => self.network_first(&request, store).await,
            Route::CacheFirst => self.cache_first(&request, store).await?,
            Route::PassThrough => return Ok(FetchDisposition::PassThrough),
        };
        Ok(FetchDisposition::Respond(routed))
    }

    async fn network_first(&self, request: &Request, store: String) -> Routed {
        let key = request.key();
        match self.network.fetch(request, CacheMode::Default).await {
            Ok(response) => {
                debug!("{} served from network", request.url);
                let fill = self.spawn_fill(store, key, response.clone());
                Routed {
                    response: Some(response),
                    source: ResponseSource::Network,
                    cache_fill: Some(fill),
                }
            }
            Err(e) => {
                debug!("Network failed for {} ({}), trying cache", request.url, e);
                match self.lookup(&store, &key).await {
                    Some(cached) => Routed::new(Some(cached), ResponseSource::Cache),
                    None => Routed::new(None, ResponseSource::Unresolved),
                }
            }
        }
    }

    async fn cache_first(&self, request: &Request, store: String) -> SwCacheResult<Routed> {
        let key = request.key();
        if let Some(cached) = self.lookup(&store, &key).await {
            debug!("{} served from {}", request.url, store);
            return Ok(Routed::new(Some(cached), ResponseSource::Cache));
        }

        let response = self.network.fetch(request, CacheMode::Default).await?;
        debug!("{} missed cache, fetched from network", request.url);
        let fill = self.spawn_fill(store, key, response.clone());
        Ok(Routed {
            response: Some(response),
            source: ResponseSource::Network,
            cache_fill: Some(fill),
        })
    }

    /// Cache lookup where any store failure counts as a miss
    async fn lookup(&self, store: &str, key: &RequestKey) -> Option<Response> {
        match self.storage.get(store, key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache lookup for {} failed, treating as miss: {}", key, e);
                None
            }
        }
    }

    fn spawn_fill(&self, store: String, key: RequestKey, response: Response) -> JoinHandle<()> {
        let storage = self.storage.clone();
        tokio::spawn(async move {
            if let Err(e) = storage.put(&store, &key, &response).await {
                warn!("Failed to cache {}: {}", key, e);
            }
        })
    }
}
