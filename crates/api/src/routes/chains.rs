//! Chain endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use atlas_model::{Chain, ChainFamily, ChainFilter, NewChain, Page};

use crate::error::Result;
use crate::state::SharedState;

pub async fn create(
    State(state): State<SharedState>,
    Json(input): Json<NewChain>,
) -> Result<Json<Chain>> {
    Ok(Json(state.registry.create_chain(input).await?))
}

pub async fn get_one(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Chain>> {
    Ok(Json(state.registry.get_chain(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub family: Option<ChainFamily>,
    pub is_testnet: Option<bool>,
    pub page_size: Option<i64>,
    pub page_token: Option<String>,
}

pub async fn list(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<Chain>>> {
    let filter = ChainFilter {
        family: params.family,
        is_testnet: params.is_testnet,
    };
    let paging = super::page(params.page_size, params.page_token.as_deref())?;
    let page = state.registry.list_chains(filter, paging).await?;
    Ok(Json(page))
}
