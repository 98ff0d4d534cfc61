//! Host capabilities the worker invokes

use async_trait::async_trait;
use tracing::info;

/// Capabilities the host runtime exposes to the worker
///
/// Both are invoked by the worker itself, never triggered from outside.
#[async_trait]
pub trait WorkerHost: Send + Sync {
    /// Stop waiting for existing pages to close before activating
    async fn skip_waiting(&self);

    /// Take control of every open page immediately
    async fn claim_clients(&self);
}

/// Host for the command line: there are no pages, so both capabilities only log
#[derive(Debug, Default)]
pub struct TracingHost;

#[async_trait]
impl WorkerHost for TracingHost {
    async fn skip_waiting(&self) {
        info!("Skipping wait: new worker proceeds to activation");
    }

    async fn claim_clients(&self) {
        info!("Claiming open pages");
    }
}
