//! Index availability, decided once at startup

use std::sync::OnceLock;

use tracing::warn;

/// Whether the inverted index can be used for the lifetime of the process
///
/// Set exactly once by the startup probe. Individual operation failures
/// never change it, so callers do not flip between backends under
/// transient errors. Until it is set the index counts as unavailable.
#[derive(Debug, Default)]
pub struct IndexHealth {
    available: OnceLock<bool>,
}

impl IndexHealth {
    /// Health that has not been probed yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Health with an already-known state
    pub fn with_state(available: bool) -> Self {
        let health = Self::new();
        health.set_available(available);
        health
    }

    /// Record the startup probe result; returns `false` if it was already recorded
    pub fn set_available(&self, available: bool) -> bool {
        let stored = self.available.set(available).is_ok();
        if !stored {
            warn!("Index availability already decided, ignoring later probe result");
        }
        stored
    }

    /// Whether reads go to the index and writes are applied
    pub fn is_available(&self) -> bool {
        self.available.get().copied().unwrap_or(false)
    }
}
