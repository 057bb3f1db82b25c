//! Asset endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atlas_model::{Asset, AssetFilter, AssetPatch, AssetType, NewAsset, Page};

use crate::error::Result;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct CreateAssetResponse {
    pub asset: Asset,
    /// Other live assets with the same symbol, for disambiguation.
    pub symbol_collisions: Vec<Asset>,
}

pub async fn create(
    State(state): State<SharedState>,
    Json(input): Json<NewAsset>,
) -> Result<Json<CreateAssetResponse>> {
    let created = state.registry.create_asset(input).await?;
    Ok(Json(CreateAssetResponse {
        asset: created.asset,
        symbol_collisions: created.symbol_collisions,
    }))
}

pub async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Asset>> {
    Ok(Json(state.registry.get_asset(id).await?))
}

pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<AssetPatch>,
) -> Result<Json<Asset>> {
    Ok(Json(state.registry.update_asset(id, patch).await?))
}

pub async fn remove(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Asset>> {
    Ok(Json(state.registry.delete_asset(id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub asset_type: Option<AssetType>,
    pub category: Option<String>,
    pub page_size: Option<i64>,
    pub page_token: Option<String>,
}

pub async fn list(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Asset>>> {
    let filter = AssetFilter {
        asset_type: params.asset_type,
        category: params.category,
    };
    let paging = super::page(params.page_size, params.page_token.as_deref())?;
    let page = state.registry.list_assets(filter, paging).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub asset_type: Option<AssetType>,
    pub category: Option<String>,
    pub page_size: Option<i64>,
    pub page_token: Option<String>,
}

pub async fn search(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Page<Asset>>> {
    let filter = AssetFilter {
        asset_type: params.asset_type,
        category: params.category,
    };
    let paging = super::page(params.page_size, params.page_token.as_deref())?;
    let page = state.registry.search_assets(&params.q, filter, paging).await?;
    Ok(Json(page))
}
