//! Application state for the web layer.

use std::sync::Arc;

use crate::gather::Gatherer;
use crate::load::Snapshot;

/// Shared application state.
///
/// The snapshot is immutable once built, so handlers share it without
/// locking.
#[derive(Debug, Clone)]
pub struct AppState {
    pub snapshot: Arc<Snapshot>,
}

impl AppState {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }

    pub fn gatherer(&self) -> Gatherer<'_> {
        Gatherer::new(&self.snapshot.timetable, &self.snapshot.locations)
    }
}
