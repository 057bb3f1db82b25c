//! Structured logging initialisation.
//!
//! `RUST_LOG` overrides the configured level when set; `log.format` picks
//! json or pretty output.
//!
//! ```bash
//! # Development — human-readable output, debug level for atlas crates
//! RUST_LOG=atlas_registry=debug ./atlas-api
//!
//! # Production — structured JSON, info level
//! ATLAS__LOG__FORMAT=json ./atlas-api
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Initialise the global tracing subscriber. Call once at the very start of
/// `main`, before anything logs.
pub fn init(log: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log.level.clone()));

    match log.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init(),
    }
}
