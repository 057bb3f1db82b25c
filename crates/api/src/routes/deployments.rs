//! Deployment endpoints and the contract-address resolution path.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use atlas_model::{Asset, Deployment, NewDeployment, Page};

use super::Paging;
use crate::error::Result;
use crate::state::SharedState;

pub async fn create(
    State(state): State<SharedState>,
    Json(input): Json<NewDeployment>,
) -> Result<Json<Deployment>> {
    Ok(Json(state.registry.create_deployment(input).await?))
}

pub async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Deployment>> {
    Ok(Json(state.registry.get_deployment(id).await?))
}

pub async fn list_by_asset(
    State(state): State<SharedState>,
    Path(asset_id): Path<Uuid>,
) -> Result<Json<Vec<Deployment>>> {
    Ok(Json(
        state.registry.list_deployments_by_asset(asset_id).await?,
    ))
}

pub async fn list_by_chain(
    State(state): State<SharedState>,
    Path(chain_id): Path<String>,
    Query(paging): Query<Paging>,
) -> Result<Json<Page<Deployment>>> {
    Ok(Json(
        state
            .registry
            .list_deployments_by_chain(&chain_id, paging.request()?)
            .await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct ResolvedAsset {
    pub deployment: Deployment,
    pub asset: Asset,
}

pub async fn resolve_asset(
    State(state): State<SharedState>,
    Path((chain_id, address)): Path<(String, String)>,
) -> Result<Json<ResolvedAsset>> {
    let (deployment, asset) = state.registry.resolve_asset(&chain_id, &address).await?;
    Ok(Json(ResolvedAsset { deployment, asset }))
}
