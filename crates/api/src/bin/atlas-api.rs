//! AssetAtlas API server binary.
//!
//! Bootstrap order: configuration, telemetry, metrics exporter, durable
//! store (fatal on failure), cache (degrades to disabled), event bus (fatal
//! when configured), then the HTTP server. Teardown happens in reverse via
//! graceful shutdown.

use std::sync::Arc;

use tracing::{error, info, warn};

use atlas_api::{config::AppConfig, telemetry, AppState, Server};
use atlas_registry::{
    CacheManager, EventSink, NatsEventBus, NullSink, Registry, RegistryOptions,
};
use atlas_store::Database;

#[tokio::main]
async fn main() {
    let config_path = std::env::var("ATLAS_CONFIG").ok();
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    telemetry::init(&config.log);
    info!(
        service = %config.service.name,
        version = %config.service.version,
        env = %config.service.env,
        "starting atlas api"
    );

    if config.metrics.enabled {
        let addr = ([0, 0, 0, 0], config.metrics.port);
        if let Err(e) = metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
        {
            error!("failed to install metrics exporter: {e}");
            std::process::exit(1);
        }
        info!(port = config.metrics.port, "metrics exporter listening");
    }

    let db = match Database::connect(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            error!("failed to connect to database: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = db.migrate().await {
        error!("failed to run migrations: {e}");
        std::process::exit(1);
    }

    let cache = match &config.cache {
        Some(cache_config) => match CacheManager::connect(cache_config).await {
            Ok(cache) => {
                info!(host = %cache_config.host, "cache connected");
                cache
            }
            Err(e) => {
                // The store stays authoritative; a dead cache only costs
                // latency.
                warn!("cache unavailable, continuing without it: {e}");
                CacheManager::disabled()
            }
        },
        None => {
            warn!("no cache configured, every read goes to the database");
            CacheManager::disabled()
        }
    };

    let events: Arc<dyn EventSink> = match &config.eventbus {
        Some(bus_config) => match NatsEventBus::connect(bus_config).await {
            Ok(bus) => Arc::new(bus),
            Err(e) => {
                // Downstream subscribers depend on the stream; starting
                // without it would silently drop committed events.
                error!("failed to connect to event bus: {e}");
                std::process::exit(1);
            }
        },
        None => {
            warn!("no event bus configured, events will be dropped");
            Arc::new(NullSink)
        }
    };

    let registry = Registry::new(
        &db,
        cache,
        config.cache_ttl.clone(),
        events,
        RegistryOptions {
            producer: config.service.name.clone(),
            ..RegistryOptions::default()
        },
    );
    let state = Arc::new(AppState::new(
        registry,
        db,
        config.service.version.clone(),
        config.auth.api_keys.clone(),
    ));

    if let Err(e) = Server::new(config.server.clone(), state).start().await {
        error!("server error: {e}");
        std::process::exit(1);
    }
}
