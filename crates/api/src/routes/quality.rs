//! Quality flag endpoints and the tradability gate.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atlas_model::{FlagFilter, FlagType, NewQualityFlag, Page, QualityFlag, Severity};

use crate::error::Result;
use crate::state::SharedState;

pub async fn raise(
    State(state): State<SharedState>,
    Json(input): Json<NewQualityFlag>,
) -> Result<Json<QualityFlag>> {
    Ok(Json(state.registry.raise_flag(input).await?))
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub resolved_by: String,
    pub resolution_notes: Option<String>,
}

pub async fn resolve(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<QualityFlag>> {
    Ok(Json(
        state
            .registry
            .resolve_flag(id, &request.resolved_by, request.resolution_notes.as_deref())
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub asset_id: Option<Uuid>,
    pub flag_type: Option<FlagType>,
    pub severity: Option<Severity>,
    #[serde(default)]
    pub active_only: bool,
    pub page_size: Option<i64>,
    pub page_token: Option<String>,
}

pub async fn list(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<QualityFlag>>> {
    let filter = FlagFilter {
        asset_id: params.asset_id,
        flag_type: params.flag_type,
        severity: params.severity,
        active_only: params.active_only,
    };
    let paging = super::page(params.page_size, params.page_token.as_deref())?;
    let page = state.registry.list_flags(filter, paging).await?;
    Ok(Json(page))
}

#[derive(Debug, Serialize)]
pub struct TradableResponse {
    pub asset_id: Uuid,
    pub tradable: bool,
}

pub async fn is_tradable(
    State(state): State<SharedState>,
    Path(asset_id): Path<Uuid>,
) -> Result<Json<TradableResponse>> {
    let tradable = state.registry.is_tradable(asset_id).await?;
    Ok(Json(TradableResponse { asset_id, tradable }))
}
