//! Application state shared across all route handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use commissary_core::{DocumentStore, IngestionOrchestrator};

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// The poll-parse-persist-reconcile pipeline.
    pub orchestrator: Arc<IngestionOrchestrator>,
    /// Record storage, for read-only record queries.
    pub store: Arc<dyn DocumentStore>,
    /// Directory holding cached attachment images.
    pub cache_dir: PathBuf,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates the state wrapping an already-wired pipeline.
    #[must_use]
    pub fn new(
        orchestrator: Arc<IngestionOrchestrator>,
        store: Arc<dyn DocumentStore>,
        cache_dir: PathBuf,
    ) -> Self {
        Self {
            orchestrator,
            store,
            cache_dir,
            start_time: Instant::now(),
        }
    }
}
