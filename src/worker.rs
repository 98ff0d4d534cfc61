//! The service worker: lifecycle events, fetch interception and messages
//!
//! A `ServiceWorker` is one worker instance. It moves through the phases in
//! [`WorkerPhase`], builds a fresh [`LifecycleController`] for each install
//! or activate attempt, and publishes the content store the router serves
//! from once activation settles.

use crate::error::SwCacheResult;
use crate::journal::{self, Journal};
use crate::lifecycle::{
    Activation, ControlMessage, Installation, LifecycleController, WorkerHost, WorkerPhase,
    WorkerSettings,
};
use crate::net::{Network, Request};
use crate::router::{ActiveCache, FetchDisposition, RequestRouter};
use crate::state::StateFile;
use crate::store::{CacheStorage, ManifestEntry};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events the host runtime delivers to a worker
#[async_trait]
pub trait WorkerHooks: Send + Sync {
    /// The worker script was installed or updated
    async fn on_install(&self) -> SwCacheResult<Installation>;

    /// The worker is ready to take control of pages
    async fn on_activate(&self) -> SwCacheResult<Activation>;

    /// A controlled page issued a request
    async fn on_fetch(&self, request: Request) -> SwCacheResult<FetchDisposition>;

    /// A page posted a message; returns the recognized control message
    async fn on_message(&self, token: &str) -> Option<ControlMessage>;
}

/// Point-in-time view of a worker and its stores
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub worker_id: String,
    pub phase: WorkerPhase,
    pub active_store: Option<String>,
    pub degraded: bool,
    pub manifest_version: Option<String>,
    pub staging_present: bool,
    pub stores: Vec<String>,
}

/// One worker instance bound to a storage backend and a network
pub struct ServiceWorker {
    id: Uuid,
    phase: Mutex<WorkerPhase>,
    active: Arc<RwLock<ActiveCache>>,
    settings: Arc<WorkerSettings>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    host: Arc<dyn WorkerHost>,
    router: RequestRouter,
    journal: Journal,
    state: StateFile,
}

impl ServiceWorker {
    /// A freshly evaluated worker, not yet installed
    pub fn new(
        settings: WorkerSettings,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        host: Arc<dyn WorkerHost>,
    ) -> Self {
        let pending = ActiveCache::Pending {
            store: settings.names.base.clone(),
        };
        Self::build(settings, storage, network, host, WorkerPhase::Parsed, pending)
    }

    /// A worker whose install finished in an earlier process
    ///
    /// A degraded marker in `state` wins; otherwise the active store is
    /// restored from the manifest entry when one exists.
    pub async fn resume(
        settings: WorkerSettings,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        host: Arc<dyn WorkerHost>,
        state: StateFile,
    ) -> SwCacheResult<Self> {
        let active = if state.is_degraded().await? {
            ActiveCache::Degraded
        } else {
            match ManifestEntry::load(&*storage, &settings.names).await? {
                Some(entry) => ActiveCache::Ready {
                    store: settings.names.content(&entry.version),
                    version: entry.version,
                },
                None => ActiveCache::Pending {
                    store: settings.names.base.clone(),
                },
            }
        };
        debug!("Resuming worker with {:?}", active);
        Ok(Self::build(
            settings,
            storage,
            network,
            host,
            WorkerPhase::Installed,
            active,
        )
        .with_state(state))
    }

    fn build(
        settings: WorkerSettings,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        host: Arc<dyn WorkerHost>,
        phase: WorkerPhase,
        active: ActiveCache,
    ) -> Self {
        let active = Arc::new(RwLock::new(active));
        let router = RequestRouter::new(storage.clone(), network.clone(), active.clone());
        Self {
            id: Uuid::new_v4(),
            phase: Mutex::new(phase),
            active,
            settings: Arc::new(settings),
            storage,
            network,
            host,
            router,
            journal: Journal::disabled(),
            state: StateFile::ephemeral(),
        }
    }

    /// Record lifecycle events in `journal`
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// Persist the degraded flag in `state`
    pub fn with_state(mut self, state: StateFile) -> Self {
        self.state = state;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    pub async fn phase(&self) -> WorkerPhase {
        *self.phase.lock().await
    }

    /// Store the router currently serves from
    pub async fn active_cache(&self) -> ActiveCache {
        self.active.read().await.clone()
    }

    fn controller(&self) -> LifecycleController {
        LifecycleController::new(
            self.settings.clone(),
            self.storage.clone(),
            self.network.clone(),
            self.host.clone(),
        )
    }

    /// Run the install phase, reporting each downloaded asset to `progress`
    pub async fn install(
        &self,
        progress: &(dyn Fn(&str) + Send + Sync),
    ) -> SwCacheResult<Installation> {
        self.transition(WorkerPhase::begin_install).await?;
        info!("Installing worker {}", self.id);

        let result = self.controller().install(progress).await;
        let ok = result.is_ok();
        self.transition(|phase| phase.finish_install(ok)).await?;

        match &result {
            Ok(installation) => {
                if let Err(e) = self.state.clear().await {
                    warn!("Failed to clear degraded marker: {}", e);
                }
                self.journal
                    .record(
                        journal::INSTALL_COMPLETED,
                        &serde_json::json!({
                            "worker": self.id.to_string(),
                            "staging_store": installation.staging_store,
                            "staged": installation.staged,
                        }),
                    )
                    .await;
            }
            Err(e) => {
                warn!("Install failed, worker {} is redundant: {}", self.id, e);
                self.journal
                    .record(
                        journal::INSTALL_FAILED,
                        &serde_json::json!({
                            "worker": self.id.to_string(),
                            "error": e.to_string(),
                        }),
                    )
                    .await;
            }
        }
        result
    }

    /// Run the activate phase
    ///
    /// The worker ends up activated either way; on failure its cache is
    /// degraded and every request passes through to the network.
    pub async fn activate(&self) -> SwCacheResult<Activation> {
        self.transition(WorkerPhase::begin_activate).await?;

        let result = self.controller().activate().await;
        {
            let mut active = self.active.write().await;
            *active = match &result {
                Ok(activation) => ActiveCache::Ready {
                    version: activation.version.clone(),
                    store: activation.content_store.clone(),
                },
                Err(_) => ActiveCache::Degraded,
            };
        }
        self.transition(WorkerPhase::finish_activate).await?;

        match &result {
            Ok(activation) => {
                if let Err(e) = self.state.clear().await {
                    warn!("Failed to clear degraded marker: {}", e);
                }
                self.journal
                    .record(
                        journal::ACTIVATE_COMPLETED,
                        &serde_json::json!({
                            "worker": self.id.to_string(),
                            "version": activation.version,
                            "content_store": activation.content_store,
                            "outcome": activation.outcome.to_string(),
                            "migrated": activation.migrated,
                            "evicted": activation.evicted,
                        }),
                    )
                    .await;
            }
            Err(e) => {
                if let Err(mark_err) = self.state.mark_degraded(e).await {
                    warn!("Failed to persist degraded marker: {}", mark_err);
                }
                self.journal
                    .record(
                        journal::ACTIVATE_FAILED,
                        &serde_json::json!({
                            "worker": self.id.to_string(),
                            "error": e.to_string(),
                        }),
                    )
                    .await;
            }
        }
        result
    }

    /// Deliver a control message
    pub async fn message(&self, token: &str) -> Option<ControlMessage> {
        match ControlMessage::parse(token) {
            Some(ControlMessage::SkipWaiting) => {
                debug!("skipWaiting received by worker {}", self.id);
                self.host.skip_waiting().await;
                Some(ControlMessage::SkipWaiting)
            }
            None => {
                debug!("Ignoring unrecognized message {:?}", token);
                None
            }
        }
    }

    /// Snapshot of the worker and the stores it manages
    pub async fn status(&self) -> SwCacheResult<WorkerStatus> {
        let names = &self.settings.names;
        let active = self.active_cache().await;
        let manifest = ManifestEntry::load(&*self.storage, names).await?;

        Ok(WorkerStatus {
            worker_id: self.id.to_string(),
            phase: self.phase().await,
            active_store: active.store().map(str::to_string),
            degraded: active == ActiveCache::Degraded,
            manifest_version: manifest.map(|m| m.version),
            staging_present: self.storage.has(&names.staging).await?,
            stores: self.storage.names().await?,
        })
    }

    async fn transition(
        &self,
        step: impl FnOnce(WorkerPhase) -> SwCacheResult<WorkerPhase>,
    ) -> SwCacheResult<()> {
        let mut phase = self.phase.lock().await;
        let next = step(*phase)?;
        debug!("Worker {}: {} -> {}", self.id, *phase, next);
        *phase = next;
        Ok(())
    }
}

#[async_trait]
impl WorkerHooks for ServiceWorker {
    async fn on_install(&self) -> SwCacheResult<Installation> {
        self.install(&|_| {}).await
    }

    async fn on_activate(&self) -> SwCacheResult<Activation> {
        self.activate().await
    }

    async fn on_fetch(&self, request: Request) -> SwCacheResult<FetchDisposition> {
        self.router.route(request).await
    }

    async fn on_message(&self, token: &str) -> Option<ControlMessage> {
        self.message(token).await
    }
}
