//! Relationship endpoints.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use atlas_model::{NewRelationship, Page, Relationship, RelationshipFilter, RelationshipType};

use crate::error::Result;
use crate::state::SharedState;

pub async fn create(
    State(state): State<SharedState>,
    Json(input): Json<NewRelationship>,
) -> Result<Json<Relationship>> {
    Ok(Json(state.registry.create_relationship(input).await?))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub from_asset_id: Option<Uuid>,
    pub to_asset_id: Option<Uuid>,
    pub relationship_type: Option<RelationshipType>,
    pub page_size: Option<i64>,
    pub page_token: Option<String>,
}

pub async fn list(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Relationship>>> {
    let filter = RelationshipFilter {
        from_asset_id: params.from_asset_id,
        to_asset_id: params.to_asset_id,
        relationship_type: params.relationship_type,
    };
    let paging = super::page(params.page_size, params.page_token.as_deref())?;
    let page = state.registry.list_relationships(filter, paging).await?;
    Ok(Json(page))
}
