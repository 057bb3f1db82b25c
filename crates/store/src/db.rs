//! Database connection management.

use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::time::Duration;
use tracing::{error, info};

use crate::error::{Result, StoreError};

/// Connection and pool settings. Field names match the `database.*` section
/// of the service configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,
    #[serde(default = "default_max_conns")]
    pub max_conns: u32,
    #[serde(default = "default_min_conns")]
    pub min_conns: u32,
    /// Maximum lifetime of a pooled connection, seconds.
    #[serde(default = "default_max_conn_lifetime")]
    pub max_conn_lifetime: u64,
    /// Timeout acquiring a connection from the pool, seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    /// Server-side statement timeout, seconds. Queries that exceed it fail
    /// fast and classify as transient.
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,
}

fn default_port() -> u16 {
    5432
}

fn default_ssl_mode() -> String {
    "prefer".to_string()
}

fn default_max_conns() -> u32 {
    10
}

fn default_min_conns() -> u32 {
    2
}

fn default_max_conn_lifetime() -> u64 {
    1800
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_query_timeout() -> u64 {
    5
}

impl DbConfig {
    fn connect_options(&self) -> Result<PgConnectOptions> {
        let ssl_mode = match self.ssl_mode.as_str() {
            "disable" => PgSslMode::Disable,
            "allow" => PgSslMode::Allow,
            "prefer" => PgSslMode::Prefer,
            "require" => PgSslMode::Require,
            "verify-ca" => PgSslMode::VerifyCa,
            "verify-full" => PgSslMode::VerifyFull,
            other => {
                return Err(StoreError::Connection(format!(
                    "unrecognized ssl_mode {other:?}"
                )))
            }
        };
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .ssl_mode(ssl_mode)
            .options([("statement_timeout", format!("{}s", self.query_timeout))]))
    }
}

/// Database connection pool. One per process, shared by every store.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        info!(
            host = %config.host,
            database = %config.database,
            max_conns = config.max_conns,
            min_conns = config.min_conns,
            "connecting to database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_conns)
            .min_connections(config.min_conns)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .max_lifetime(Duration::from_secs(config.max_conn_lifetime))
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| {
                error!("failed to connect to database: {e}");
                StoreError::Connection(format!(
                    "failed to connect to {}/{}: {e}",
                    config.host, config.database
                ))
            })?;

        info!("database connection established");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run schema migrations. Forward-only versioned files, executed in
    /// order; each file is idempotent enough to re-run on a clean schema
    /// only, so migration state is tracked in `schema_migrations`.
    pub async fn migrate(&self) -> Result<()> {
        info!("running database migrations");

        sqlx::query(
            r#"
            create table if not exists schema_migrations (
                version text primary key,
                applied_at timestamptz not null default now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Migration(format!("failed to create migrations table: {e}")))?;

        for (version, sql) in MIGRATIONS {
            let applied: Option<(String,)> =
                sqlx::query_as("select version from schema_migrations where version = $1")
                    .bind(version)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(|e| {
                        StoreError::Migration(format!("failed to read migration state: {e}"))
                    })?;
            if applied.is_some() {
                continue;
            }

            info!(version, "applying migration");
            let mut tx = self.pool.begin().await.map_err(StoreError::from)?;
            sqlx::raw_sql(sql).execute(&mut *tx).await.map_err(|e| {
                error!(version, "migration failed: {e}");
                StoreError::Migration(format!("failed to run {version}: {e}"))
            })?;
            sqlx::query("insert into schema_migrations (version) values ($1)")
                .bind(version)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    StoreError::Migration(format!("failed to record {version}: {e}"))
                })?;
            tx.commit().await.map_err(StoreError::from)?;
        }

        info!("database migrations completed");
        Ok(())
    }

    /// Check database health with a trivial probe.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("select 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Current pool occupancy (open connections, idle connections),
    /// surfaced by the readiness probe so operators can spot exhaustion
    /// before acquire timeouts start.
    pub fn pool_occupancy(&self) -> (u32, usize) {
        (self.pool.size(), self.pool.num_idle())
    }
}

/// Ordered migration set, embedded so the binary is self-contained.
/// Rollback files live next to these under `migrations/` but are applied by
/// operators, never by the service.
const MIGRATIONS: &[(&str, &str)] = &[
    ("0001_init", include_str!("../migrations/0001_init.sql")),
    ("0002_indexes", include_str!("../migrations/0002_indexes.sql")),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config: DbConfig = serde_json::from_value(serde_json::json!({
            "host": "localhost",
            "user": "atlas",
            "database": "atlas",
        }))
        .unwrap();
        assert_eq!(config.port, 5432);
        assert_eq!(config.max_conns, 10);
        assert_eq!(config.query_timeout, 5);
        assert!(config.connect_options().is_ok());
    }

    #[test]
    fn bad_ssl_mode_rejected() {
        let config: DbConfig = serde_json::from_value(serde_json::json!({
            "host": "localhost",
            "user": "atlas",
            "database": "atlas",
            "ssl_mode": "mandatory",
        }))
        .unwrap();
        assert!(config.connect_options().is_err());
    }
}
