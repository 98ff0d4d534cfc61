//! swcache - offline asset cache for progressive web apps
//!
//! Implements the caching half of a service worker: an install phase that
//! pre-fetches the application shell, an activate phase that moves it into a
//! store named after the published version and evicts older versions, and a
//! request router that serves pages network-first and assets cache-first.
//!
//! The host platform is abstracted behind three traits, so the same core runs
//! in memory or against a directory and a real HTTP client:
//! [`store::CacheStorage`], [`net::Network`] and [`lifecycle::WorkerHost`].

pub mod cli;
pub mod config;
pub mod error;
pub mod journal;
pub mod lifecycle;
pub mod net;
pub mod router;
pub mod state;
pub mod store;
pub mod ui;
pub mod version;
pub mod worker;

#[cfg(test)]
mod testing;

pub use error::{SwCacheError, SwCacheResult};
pub use worker::{ServiceWorker, WorkerHooks};
