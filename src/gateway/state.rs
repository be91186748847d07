//! Shared gate state for the polling variant

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Point-in-time view of the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSnapshot {
    /// Whether the gate is currently open.
    pub is_open: bool,
    /// Visitor name the gate was last opened for; empty when closed.
    pub name: String,
    /// Unix seconds of the last transition; 0 before the first one.
    pub timestamp: i64,
}

impl Default for GateSnapshot {
    fn default() -> Self {
        Self {
            is_open: false,
            name: String::new(),
            timestamp: 0,
        }
    }
}

/// Process-wide record of the current gate status.
///
/// The single source of truth for the polling variant. Every operation takes
/// the lock exactly once, so a reader never observes a name belonging to a
/// different transition than the open flag.
#[derive(Debug, Default)]
pub struct GateState {
    inner: RwLock<GateSnapshot>,
}

impl GateState {
    /// New state in the initial closed position.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate for `name` and return the new snapshot.
    /// Empty names are allowed.
    pub fn open(&self, name: &str) -> GateSnapshot {
        let mut inner = self.inner.write();
        inner.is_open = true;
        inner.name = name.to_string();
        inner.timestamp = Utc::now().timestamp();
        inner.clone()
    }

    /// Close the gate and return the new snapshot.
    /// The timestamp refreshes, matching `open`.
    pub fn close(&self) -> GateSnapshot {
        let mut inner = self.inner.write();
        inner.is_open = false;
        inner.name = String::new();
        inner.timestamp = Utc::now().timestamp();
        inner.clone()
    }

    /// Current snapshot, read-only.
    #[must_use]
    pub fn status(&self) -> GateSnapshot {
        self.inner.read().clone()
    }
}
