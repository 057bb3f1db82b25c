//! Venue and venue-asset endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use atlas_model::{
    NewVenue, NewVenueAsset, Page, Venue, VenueAsset, VenueAssetFilter, VenueType,
};

use crate::error::Result;
use crate::state::SharedState;

pub async fn create(
    State(state): State<SharedState>,
    Json(input): Json<NewVenue>,
) -> Result<Json<Venue>> {
    Ok(Json(state.registry.create_venue(input).await?))
}

pub async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Venue>> {
    Ok(Json(state.registry.get_venue(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub venue_type: Option<VenueType>,
    #[serde(default)]
    pub active_only: bool,
    pub page_size: Option<i64>,
    pub page_token: Option<String>,
}

pub async fn list(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Venue>>> {
    let paging = super::page(params.page_size, params.page_token.as_deref())?;
    Ok(Json(
        state
            .registry
            .list_venues(params.venue_type, params.active_only, paging)
            .await?,
    ))
}

pub async fn create_venue_asset(
    State(state): State<SharedState>,
    Json(input): Json<NewVenueAsset>,
) -> Result<Json<VenueAsset>> {
    Ok(Json(state.registry.create_venue_asset(input).await?))
}

pub async fn get_venue_asset(
    State(state): State<SharedState>,
    Path((venue_id, asset_id)): Path<(String, Uuid)>,
) -> Result<Json<VenueAsset>> {
    Ok(Json(
        state.registry.get_venue_asset(&venue_id, asset_id).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct VenueAssetParams {
    pub venue_id: Option<String>,
    pub asset_id: Option<Uuid>,
    pub trading_enabled: Option<bool>,
    #[serde(default)]
    pub active_only: bool,
    pub page_size: Option<i64>,
    pub page_token: Option<String>,
}

pub async fn list_venue_assets(
    State(state): State<SharedState>,
    Query(params): Query<VenueAssetParams>,
) -> Result<Json<Page<VenueAsset>>> {
    let filter = VenueAssetFilter {
        venue_id: params.venue_id,
        asset_id: params.asset_id,
        trading_enabled: params.trading_enabled,
        active_only: params.active_only,
    };
    let paging = super::page(params.page_size, params.page_token.as_deref())?;
    Ok(Json(
        state.registry.list_venue_assets(filter, paging).await?,
    ))
}
