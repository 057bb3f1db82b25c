//! Liveness and readiness probes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub timestamp: i64,
}

/// Liveness: ok while the process is not shutting down.
pub async fn live(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, label) = if state.is_shutting_down() {
        (StatusCode::SERVICE_UNAVAILABLE, "shutting_down")
    } else {
        (StatusCode::OK, "ok")
    };
    (
        status,
        Json(HealthResponse {
            status: label,
            version: state.version.clone(),
            timestamp: chrono::Utc::now().timestamp(),
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub database: bool,
    pub cache: bool,
    pub pool: PoolHealth,
}

#[derive(Debug, Serialize)]
pub struct PoolHealth {
    pub connections: u32,
    pub idle: usize,
}

/// Readiness: ready only when the durable store answers a trivial probe and
/// the cache (when configured) does too. Pool occupancy rides along so a
/// saturated pool is visible before acquire timeouts are.
pub async fn ready(State(state): State<SharedState>) -> (StatusCode, Json<ReadyResponse>) {
    let database = state.db.health_check().await.is_ok();
    let cache = if state.registry.cache().is_enabled() {
        state.registry.cache().ping().await
    } else {
        true
    };
    let (connections, idle) = state.db.pool_occupancy();

    let ready = database && cache;
    (
        if ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        },
        Json(ReadyResponse {
            status: if ready { "ready" } else { "not_ready" },
            database,
            cache,
            pool: PoolHealth { connections, idle },
        }),
    )
}
