//! Api-key authentication.
//!
//! When keys are configured, every request outside the health endpoints must
//! carry one in `x-api-key`. With no keys configured the middleware passes
//! everything through (development wiring).

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::SharedState;

pub const API_KEY_HEADER: &str = "x-api-key";

pub async fn require_api_key(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.api_keys.is_empty() {
        return Ok(next.run(request).await);
    }

    let supplied = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    match supplied {
        Some(key) if state.api_keys.iter().any(|k| k == key) => Ok(next.run(request).await),
        _ => Err(ApiError::Unauthenticated),
    }
}
