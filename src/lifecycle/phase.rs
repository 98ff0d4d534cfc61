//! Worker phase state machine
//!
//! | Phase | Next on success | Next on failure |
//! |-------|-----------------|-----------------|
//! | Parsed | Installing | - |
//! | Installing | Installed | Redundant |
//! | Installed | Activating | - |
//! | Activating | Activated | Activated (degraded) |
//! | Activated | - | - |
//! | Redundant | - | - |

use crate::error::{SwCacheError, SwCacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of one worker instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerPhase {
    /// Script evaluated, nothing run yet
    Parsed,
    /// Install task in flight
    Installing,
    /// Install finished, waiting to activate
    Installed,
    /// Activate task in flight
    Activating,
    /// Controlling pages
    Activated,
    /// Install failed; this instance will never activate
    Redundant,
}

impl WorkerPhase {
    /// Enter the install phase
    pub fn begin_install(self) -> SwCacheResult<Self> {
        self.expect(Self::Parsed, "install", Self::Installing)
    }

    /// Leave the install phase
    pub fn finish_install(self, ok: bool) -> SwCacheResult<Self> {
        let next = if ok { Self::Installed } else { Self::Redundant };
        self.expect(Self::Installing, "finish install", next)
    }

    /// Enter the activate phase
    pub fn begin_activate(self) -> SwCacheResult<Self> {
        self.expect(Self::Installed, "activate", Self::Activating)
    }

    /// Leave the activate phase
    ///
    /// A failed activation still activates the worker; its cache is degraded
    /// and every request goes to the network.
    pub fn finish_activate(self) -> SwCacheResult<Self> {
        self.expect(Self::Activating, "finish activate", Self::Activated)
    }

    /// Whether the instance is still waiting for activation
    pub fn is_waiting(self) -> bool {
        matches!(self, Self::Installed)
    }

    fn expect(self, from: Self, event: &'static str, to: Self) -> SwCacheResult<Self> {
        if self == from {
            Ok(to)
        } else {
            Err(SwCacheError::InvalidTransition { phase: self, event })
        }
    }
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        write!(f, "{}", name)
    }
}
