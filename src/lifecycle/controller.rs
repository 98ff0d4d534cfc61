//! Install and activate phases
//!
//! A `LifecycleController` is built for one lifecycle attempt. It owns the
//! version resolved during that attempt and the content store name derived
//! from it; `activate` consumes the controller, so nothing survives a
//! finished or failed attempt.

use crate::error::{SwCacheError, SwCacheResult};
use crate::lifecycle::host::WorkerHost;
use crate::lifecycle::settings::WorkerSettings;
use crate::net::{CacheMode, Network, Request, RequestKey, Response};
use crate::store::{copy_entries, CacheStorage, ManifestEntry};
use crate::version::VersionResolver;
use futures_util::future::try_join_all;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How the manifest compared with the resolved version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// No manifest entry: no activation had ever completed
    FirstActivation,
    /// The manifest recorded another version; every content store was evicted
    VersionChanged { previous: String },
    /// The manifest already recorded this version
    Unchanged,
}

impl fmt::Display for ActivationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstActivation => write!(f, "first activation"),
            Self::VersionChanged { previous } => write!(f, "upgraded from {}", previous),
            Self::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Result of a successful activation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub version: String,
    pub content_store: String,
    pub outcome: ActivationOutcome,
    /// Entries copied from the staging store
    pub migrated: usize,
    /// Stores deleted because of a version change
    pub evicted: Vec<String>,
}

/// Result of a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub staging_store: String,
    pub staged: usize,
}

/// Drives the cache stores through install and activate
pub struct LifecycleController {
    settings: Arc<WorkerSettings>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    host: Arc<dyn WorkerHost>,
    version: Option<String>,
    content_store: Option<String>,
}

impl LifecycleController {
    /// Create a controller for one lifecycle attempt
    pub fn new(
        settings: Arc<WorkerSettings>,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        host: Arc<dyn WorkerHost>,
    ) -> Self {
        Self {
            settings,
            storage,
            network,
            host,
            version: None,
            content_store: None,
        }
    }

    /// Pre-fetch the application shell into the staging store
    ///
    /// The fill is all-or-nothing: if any asset fails to download or answers
    /// with a non-2xx status, nothing is written. `progress` is called once
    /// per downloaded asset.
    pub async fn install(
        &self,
        progress: &(dyn Fn(&str) + Send + Sync),
    ) -> SwCacheResult<Installation> {
        // Expedited takeover: don't wait for pages controlled by an older worker
        self.host.skip_waiting().await;

        let staging = &self.settings.names.staging;
        self.storage.open(staging).await?;

        let fetches = self.settings.core_assets.iter().map(|url| async move {
            let request = Request::get(url);
            let response = self.network.fetch(&request, CacheMode::Default).await?;
            if !response.is_ok() {
                return Err(SwCacheError::PrefetchStatus {
                    url: url.clone(),
                    status: response.status,
                });
            }
            progress(url);
            Ok::<(RequestKey, Response), SwCacheError>((request.key(), response))
        });
        let fetched = try_join_all(fetches).await?;

        for (key, response) in &fetched {
            self.storage.put(staging, key, response).await?;
        }

        info!("Staged {} assets in {}", fetched.len(), staging);
        Ok(Installation {
            staging_store: staging.clone(),
            staged: fetched.len(),
        })
    }

    /// Reconcile the staging store into the version-qualified content store
    ///
    /// Any failure deletes the content, staging and manifest stores before the
    /// error is returned, leaving the app on plain network fetches.
    pub async fn activate(mut self) -> SwCacheResult<Activation> {
        match self.reconcile().await {
            Ok(activation) => Ok(activation),
            Err(e) => {
                error!("Activation failed: {}", e);
                self.discard_all().await;
                Err(e)
            }
        }
    }

    async fn reconcile(&mut self) -> SwCacheResult<Activation> {
        let names = &self.settings.names;

        let resolver = VersionResolver::new(
            self.network.clone(),
            self.settings.version_url.clone(),
            self.settings.include_build_number,
        );
        let version = resolver.resolve().await?;
        let content = names.content(&version);
        self.version = Some(version.clone());
        self.content_store = Some(content.clone());

        let outcome = match ManifestEntry::load(&*self.storage, names).await? {
            None => {
                // Guard against a leftover store reusing this name
                self.storage.delete(&content).await?;
                ActivationOutcome::FirstActivation
            }
            Some(previous) if previous.version != version => {
                info!(
                    "New version detected ({} -> {}), clearing old caches",
                    previous.version, version
                );
                ActivationOutcome::VersionChanged {
                    previous: previous.version,
                }
            }
            Some(_) => ActivationOutcome::Unchanged,
        };

        let evicted = if matches!(outcome, ActivationOutcome::VersionChanged { .. }) {
            self.evict_content_stores().await?
        } else {
            Vec::new()
        };

        let migrated = copy_entries(&*self.storage, &names.staging, &content).await?;
        self.storage.delete(&names.staging).await?;
        ManifestEntry::new(version.as_str())
            .save(&*self.storage, names)
            .await?;

        self.host.claim_clients().await;

        info!(
            "Activated version {} ({} entries migrated into {})",
            version, migrated, content
        );
        Ok(Activation {
            version,
            content_store: content,
            outcome,
            migrated,
            evicted,
        })
    }

    /// Delete every store in the content family
    async fn evict_content_stores(&self) -> SwCacheResult<Vec<String>> {
        let mut evicted = Vec::new();
        for name in self.storage.names().await? {
            if self.settings.names.is_content_store(&name) {
                self.storage.delete(&name).await?;
                debug!("Evicted {}", name);
                evicted.push(name);
            }
        }
        Ok(evicted)
    }

    /// Fatal-path cleanup; failures here are logged, the original error wins
    ///
    /// When the version never resolved, the content store name is unknown,
    /// so the whole content family goes.
    async fn discard_all(&self) {
        let names = &self.settings.names;
        let mut doomed = vec![
            names.staging.clone(),
            names.manifest.clone(),
            names.base.clone(),
        ];
        if let Some(content) = &self.content_store {
            doomed.push(content.clone());
        }
        match self.storage.names().await {
            Ok(existing) => doomed.extend(
                existing
                    .into_iter()
                    .filter(|name| names.is_content_store(name)),
            ),
            Err(e) => warn!("Failed to list stores during cleanup: {}", e),
        }
        doomed.sort();
        doomed.dedup();

        for name in &doomed {
            if let Err(e) = self.storage.delete(name).await {
                warn!("Failed to delete {} during cleanup: {}", name, e);
            }
        }
        info!(
            "Discarded cache stores after failed activation of {}",
            self.version.as_deref().unwrap_or("unknown version")
        );
    }
}
