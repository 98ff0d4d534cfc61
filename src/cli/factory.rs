//! Backend construction for CLI commands
//!
//! Every command runs as one worker instance over the on-disk stores and a
//! real HTTP client.

use crate::config::Config;
use crate::error::SwCacheResult;
use crate::journal::Journal;
use crate::lifecycle::TracingHost;
use crate::net::{HttpNetwork, Network};
use crate::state::StateFile;
use crate::store::{CacheStorage, DiskStorage};
use crate::worker::ServiceWorker;
use std::sync::Arc;
use tracing::debug;

/// Persistent storage under the configured directory
pub fn create_storage(config: &Config) -> Arc<dyn CacheStorage> {
    let dir = config.storage_dir();
    debug!("Using cache storage at {}", dir.display());
    Arc::new(DiskStorage::new(dir))
}

/// HTTP client honoring the network settings
pub fn create_network(config: &Config) -> Arc<dyn Network> {
    Arc::new(HttpNetwork::new(&config.network))
}

/// A freshly evaluated worker, used by `install` and `update`
pub fn new_worker(config: &Config) -> SwCacheResult<ServiceWorker> {
    let worker = ServiceWorker::new(
        config.worker_settings()?,
        create_storage(config),
        create_network(config),
        Arc::new(TracingHost),
    );
    Ok(worker
        .with_journal(Journal::new(config))
        .with_state(StateFile::new(config)))
}

/// The installed worker, picked up from the persisted stores
pub async fn resume_worker(config: &Config) -> SwCacheResult<ServiceWorker> {
    let worker = ServiceWorker::resume(
        config.worker_settings()?,
        create_storage(config),
        create_network(config),
        Arc::new(TracingHost),
        StateFile::new(config),
    )
    .await?;
    Ok(worker.with_journal(Journal::new(config)))
}
