//! Shared request state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use atlas_registry::Registry;
use atlas_store::Database;

pub struct AppState {
    pub registry: Registry,
    pub db: Database,
    pub version: String,
    /// Accepted api keys; empty disables auth.
    pub api_keys: Vec<String>,
    shutting_down: AtomicBool,
}

impl AppState {
    pub fn new(registry: Registry, db: Database, version: String, api_keys: Vec<String>) -> Self {
        Self {
            registry,
            db,
            version,
            api_keys,
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Flipped once when shutdown begins; liveness reports it so the
    /// orchestrator stops routing before the listener closes.
    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }
}

pub type SharedState = Arc<AppState>;
