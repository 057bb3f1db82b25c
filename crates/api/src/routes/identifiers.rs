//! External identifier endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use atlas_model::{EntityRef, EntityType, Identifier, NewIdentifier, Page};

use super::Paging;
use crate::error::Result;
use crate::state::SharedState;

pub async fn create(
    State(state): State<SharedState>,
    Json(input): Json<NewIdentifier>,
) -> Result<Json<Identifier>> {
    Ok(Json(state.registry.create_identifier(input).await?))
}

pub async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Identifier>> {
    Ok(Json(state.registry.get_identifier(id).await?))
}

#[derive(Debug, Serialize)]
pub struct ResolvedExternal {
    pub identifier: Identifier,
    pub entity: EntityRef,
}

pub async fn resolve_external(
    State(state): State<SharedState>,
    Path((source, external_id)): Path<(String, String)>,
) -> Result<Json<ResolvedExternal>> {
    let (identifier, entity) = state
        .registry
        .resolve_external_id(&source, &external_id)
        .await?;
    Ok(Json(ResolvedExternal { identifier, entity }))
}

pub async fn list_by_entity(
    State(state): State<SharedState>,
    Path((entity_type, entity_id)): Path<(EntityType, Uuid)>,
) -> Result<Json<Vec<Identifier>>> {
    Ok(Json(
        state
            .registry
            .list_identifiers_by_entity(entity_type, entity_id)
            .await?,
    ))
}

pub async fn list_by_source(
    State(state): State<SharedState>,
    Path(source): Path<String>,
    Query(paging): Query<Paging>,
) -> Result<Json<Page<Identifier>>> {
    Ok(Json(
        state
            .registry
            .list_identifiers_by_source(&source, paging.request()?)
            .await?,
    ))
}
