//! Worker lifecycle: install, activate and control messages
//!
//! Install fills the staging store from the asset manifest. Activate resolves
//! the published version and reconciles the staging store into the
//! version-qualified content store:
//!
//! | Manifest entry | Action before the copy step |
//! |----------------|-----------------------------|
//! | absent | delete any store already using the content name |
//! | other version | delete every store prefixed by the base name |
//! | same version | nothing |
//!
//! The copy step moves staging entries into the content store, deletes the
//! staging store, records the version and claims open pages. Any failure
//! deletes the content, staging and manifest stores.

mod controller;
mod host;
mod message;
mod phase;
mod settings;

pub use controller::{Activation, ActivationOutcome, Installation, LifecycleController};
pub use host::{TracingHost, WorkerHost};
pub use message::{ControlMessage, SKIP_WAITING};
pub use phase::WorkerPhase;
pub use settings::WorkerSettings;
