//! AssetAtlas HTTP surface.
//!
//! A thin transport over the registry: REST verbs for every registry
//! operation, health probes, api-key auth, and the process configuration
//! document. No business rules live here.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::AppConfig;
pub use error::{ApiError, Result};
pub use server::Server;
pub use state::AppState;
