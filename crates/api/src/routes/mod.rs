//! API routes.

pub mod assets;
pub mod chains;
pub mod deployments;
pub mod groups;
pub mod health;
pub mod identifiers;
pub mod instruments;
pub mod markets;
pub mod quality;
pub mod relationships;
pub mod venues;

use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::Router;
use serde::Deserialize;

use atlas_model::PageRequest;

use crate::error::{ApiError, Result};
use crate::middleware::require_api_key;
use crate::state::SharedState;

/// Common paging query parameters. Kept as plain fields on each params
/// struct rather than `#[serde(flatten)]`: flattening forces
/// serde_urlencoded through its buffering path, which cannot parse numeric
/// fields.
#[derive(Debug, Default, Deserialize)]
pub struct Paging {
    pub page_size: Option<i64>,
    pub page_token: Option<String>,
}

impl Paging {
    pub fn request(&self) -> Result<PageRequest> {
        page(self.page_size, self.page_token.as_deref())
    }
}

/// Validates paging inputs into a [`PageRequest`], mapping violations onto
/// the InvalidArgument kind.
pub fn page(page_size: Option<i64>, page_token: Option<&str>) -> Result<PageRequest> {
    PageRequest::new(page_size, page_token).map_err(|e| ApiError::Registry(e.into()))
}

/// Create the main API router.
pub fn create_router(state: SharedState) -> Router {
    let api = Router::new()
        // Assets
        .route("/assets", post(assets::create).get(assets::list))
        .route("/assets/search", get(assets::search))
        .route(
            "/assets/:id",
            get(assets::get_one).patch(assets::update).delete(assets::remove),
        )
        .route("/assets/:id/deployments", get(deployments::list_by_asset))
        .route("/assets/:id/tradable", get(quality::is_tradable))
        // Chains
        .route("/chains", post(chains::create).get(chains::list))
        .route("/chains/:id", get(chains::get_one))
        .route("/chains/:id/deployments", get(deployments::list_by_chain))
        // Deployments
        .route("/deployments", post(deployments::create))
        .route("/deployments/:id", get(deployments::get_one))
        // Relationships
        .route(
            "/relationships",
            post(relationships::create).get(relationships::list),
        )
        // Groups
        .route("/groups", post(groups::create).get(groups::list))
        .route("/groups/:id", get(groups::get_one))
        .route("/groups/by-name/:name", get(groups::get_by_name))
        .route(
            "/groups/:id/members",
            post(groups::add_member).get(groups::list_members),
        )
        .route(
            "/groups/:id/members/:asset_id",
            delete(groups::remove_member),
        )
        // Quality flags
        .route("/quality/flags", post(quality::raise).get(quality::list))
        .route("/quality/flags/:id/resolve", post(quality::resolve))
        // Instruments
        .route("/instruments/spot", post(instruments::create_spot))
        .route("/instruments/perpetual", post(instruments::create_perp))
        .route("/instruments/future", post(instruments::create_future))
        .route("/instruments/option", post(instruments::create_option))
        .route(
            "/instruments/lending-deposit",
            post(instruments::create_lending_deposit),
        )
        .route(
            "/instruments/lending-borrow",
            post(instruments::create_lending_borrow),
        )
        .route("/instruments/:id", get(instruments::get_one))
        .route("/instruments/:id/markets", get(markets::list_by_instrument))
        // Markets
        .route("/markets", post(markets::create))
        .route("/markets/:id", get(markets::get_one).patch(markets::update))
        .route("/markets/:id/delist", post(markets::delist))
        // Venues
        .route("/venues", post(venues::create).get(venues::list))
        .route("/venues/:id", get(venues::get_one))
        .route("/venues/:id/markets", get(markets::list_by_venue))
        .route(
            "/venues/:venue_id/assets/:asset_id",
            get(venues::get_venue_asset),
        )
        .route(
            "/venue-assets",
            post(venues::create_venue_asset).get(venues::list_venue_assets),
        )
        // Identifiers
        .route("/identifiers", post(identifiers::create))
        .route("/identifiers/:id", get(identifiers::get_one))
        .route(
            "/identifiers/by-entity/:entity_type/:entity_id",
            get(identifiers::list_by_entity),
        )
        .route(
            "/identifiers/by-source/:source",
            get(identifiers::list_by_source),
        )
        // Resolution
        .route(
            "/resolve/market/:venue_id/:venue_symbol",
            get(markets::resolve),
        )
        .route(
            "/resolve/asset/:chain_id/:address",
            get(deployments::resolve_asset),
        )
        .route(
            "/resolve/external/:source/:external_id",
            get(identifiers::resolve_external),
        )
        .layer(from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", api)
        .with_state(state)
}
