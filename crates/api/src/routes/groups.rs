//! Asset group endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atlas_model::{AssetGroup, GroupMember, NewGroup, Page};

use super::Paging;
use crate::error::Result;
use crate::state::SharedState;

pub async fn create(
    State(state): State<SharedState>,
    Json(input): Json<NewGroup>,
) -> Result<Json<AssetGroup>> {
    Ok(Json(state.registry.create_group(input).await?))
}

pub async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AssetGroup>> {
    Ok(Json(state.registry.get_group(id).await?))
}

pub async fn get_by_name(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<AssetGroup>> {
    Ok(Json(state.registry.get_group_by_name(&name).await?))
}

pub async fn list(
    State(state): State<SharedState>,
    Query(paging): Query<Paging>,
) -> Result<Json<Page<AssetGroup>>> {
    Ok(Json(state.registry.list_groups(paging.request()?).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub asset_id: Uuid,
    pub weight: Option<Decimal>,
}

pub async fn add_member(
    State(state): State<SharedState>,
    Path(group_id): Path<Uuid>,
    Json(request): Json<AddMemberRequest>,
) -> Result<Json<GroupMember>> {
    Ok(Json(
        state
            .registry
            .add_group_member(group_id, request.asset_id, request.weight)
            .await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct RemoveMemberResponse {
    pub removed: bool,
}

pub async fn remove_member(
    State(state): State<SharedState>,
    Path((group_id, asset_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RemoveMemberResponse>> {
    let removed = state.registry.remove_group_member(group_id, asset_id).await?;
    Ok(Json(RemoveMemberResponse { removed }))
}

pub async fn list_members(
    State(state): State<SharedState>,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Vec<GroupMember>>> {
    Ok(Json(state.registry.list_group_members(group_id).await?))
}
