//! The service configuration document.
//!
//! Loaded from an optional file plus `ATLAS__`-prefixed environment
//! overrides (`ATLAS__DATABASE__HOST=db1` overrides `database.host`). The
//! recognized sections are enumerated here; unknown top-level keys are
//! rejected.

use serde::Deserialize;

use atlas_registry::{CacheConfig, EventBusConfig, TtlConfig};
use atlas_store::DbConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DbConfig,
    /// Absent cache section means the process runs without a cache.
    #[serde(default)]
    pub cache: Option<CacheConfig>,
    /// Absent eventbus section means events are dropped (development only).
    #[serde(default)]
    pub eventbus: Option<EventBusConfig>,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache_ttl: TtlConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_service_version")]
    pub version: String,
    #[serde(default = "default_env")]
    pub env: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
            env: default_env(),
        }
    }
}

fn default_service_name() -> String {
    "atlas".to_string()
}

fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_env() -> String {
    "dev".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Reserved for the gRPC listener; carried in the document so deploys
    /// can pin it before that listener ships.
    #[serde(default = "default_grpc_port")]
    pub grpc_port: u16,
    /// Grace period for in-flight requests on shutdown, seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            grpc_port: default_grpc_port(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_grpc_port() -> u16 {
    9090
}

fn default_shutdown_timeout() -> u64 {
    20
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `json` or `pretty`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9100
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TracingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
}

fn default_sample_rate() -> f64 {
    0.1
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Accepted api keys. Empty means auth is disabled.
    #[serde(default)]
    pub api_keys: Vec<String>,
}

impl AppConfig {
    /// File (optional) + environment overrides, environment winning.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("ATLAS")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .try_parsing(true),
        );
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_document_fills_defaults() {
        let config: AppConfig = serde_json::from_value(serde_json::json!({
            "database": {
                "host": "localhost",
                "user": "atlas",
                "database": "atlas",
            },
        }))
        .unwrap();
        assert_eq!(config.service.name, "atlas");
        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.server.shutdown_timeout, 20);
        assert!(config.cache.is_none());
        assert!(config.eventbus.is_none());
        assert!(!config.metrics.enabled);
        assert!(config.auth.api_keys.is_empty());
        assert_eq!(config.cache_ttl.asset, 3600);
    }

    #[test]
    fn unknown_sections_rejected() {
        let result: Result<AppConfig, _> = serde_json::from_value(serde_json::json!({
            "database": {
                "host": "localhost",
                "user": "atlas",
                "database": "atlas",
            },
            "dynamic_extras": {"x": 1},
        }));
        assert!(result.is_err());
    }
}
