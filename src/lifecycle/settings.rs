//! Resolved settings shared by every lifecycle attempt

use crate::store::StoreNames;

/// Everything the lifecycle needs to know about the deployed app
///
/// All URLs are absolute (resolved against the app scope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    pub names: StoreNames,
    pub version_url: String,
    pub include_build_number: bool,
    /// Application shell assets pre-fetched at install time
    pub core_assets: Vec<String>,
}
