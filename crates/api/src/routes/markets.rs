//! Market endpoints, including the hot resolution path.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use atlas_model::{Market, MarketPatch, NewMarket, Page, ResolvedMarket};

use super::Paging;
use crate::error::Result;
use crate::state::SharedState;

pub async fn create(
    State(state): State<SharedState>,
    Json(input): Json<NewMarket>,
) -> Result<Json<Market>> {
    Ok(Json(state.registry.create_market(input).await?))
}

pub async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Market>> {
    Ok(Json(state.registry.get_market(id).await?))
}

pub async fn update(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<MarketPatch>,
) -> Result<Json<Market>> {
    Ok(Json(state.registry.update_market(id, patch).await?))
}

pub async fn delist(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Market>> {
    Ok(Json(state.registry.delist_market(id).await?))
}

/// The hot path: venue + venue-local symbol to the market, its instrument,
/// and venue-scoped specs.
pub async fn resolve(
    State(state): State<SharedState>,
    Path((venue_id, venue_symbol)): Path<(String, String)>,
) -> Result<Json<ResolvedMarket>> {
    Ok(Json(
        state.registry.resolve_market(&venue_id, &venue_symbol).await?,
    ))
}

pub async fn list_by_instrument(
    State(state): State<SharedState>,
    Path(instrument_id): Path<Uuid>,
    Query(paging): Query<Paging>,
) -> Result<Json<Page<Market>>> {
    Ok(Json(
        state
            .registry
            .list_markets_by_instrument(instrument_id, paging.request()?)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct VenueMarketParams {
    pub status: Option<String>,
    pub page_size: Option<i64>,
    pub page_token: Option<String>,
}

pub async fn list_by_venue(
    State(state): State<SharedState>,
    Path(venue_id): Path<String>,
    Query(params): Query<VenueMarketParams>,
) -> Result<Json<Page<Market>>> {
    let paging = super::page(params.page_size, params.page_token.as_deref())?;
    Ok(Json(
        state
            .registry
            .list_markets_by_venue(&venue_id, params.status.as_deref(), paging)
            .await?,
    ))
}
