//! Network abstraction
//!
//! Provides a trait for the fetch primitive so the worker can run against
//! a real HTTP client (the CLI) or a scripted network (tests, embedding).

use crate::error::SwCacheResult;
use crate::net::message::{CacheMode, Request, Response};
use async_trait::async_trait;

/// Abstract fetch interface
///
/// Mirrors the browser fetch primitive: any HTTP status, including 4xx and
/// 5xx, is a successful fetch. Only transport failures are errors.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform the request with the given cache semantics
    async fn fetch(&self, request: &Request, cache: CacheMode) -> SwCacheResult<Response>;

    /// Human-readable backend name for display
    fn name(&self) -> &'static str;
}
