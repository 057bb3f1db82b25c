//! Venue and venue-asset operations.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use atlas_model::{
    EventType, NewVenue, NewVenueAsset, Page, PageRequest, Venue, VenueAsset, VenueAssetFilter,
    VenueType,
};

use crate::asset::non_empty;
use crate::cache::keys;
use crate::error::{RegistryError, Result};
use crate::registry::Registry;

static VENUE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-z0-9][a-z0-9_]{0,63}$").expect("venue id regex"));

impl Registry {
    pub async fn create_venue(&self, input: NewVenue) -> Result<Venue> {
        if !VENUE_ID.is_match(&input.id) {
            return Err(RegistryError::invalid(
                "id",
                "must be lowercase alphanumeric/underscore, at most 64 chars",
            ));
        }
        let input = NewVenue {
            name: non_empty("name", &input.name)?,
            ..input
        };
        if input.venue_type.requires_chain() {
            match &input.chain_id {
                Some(chain_id) => {
                    self.get_chain(chain_id).await?;
                }
                None => {
                    return Err(RegistryError::invalid(
                        "chain_id",
                        format!("required for {} venues", input.venue_type),
                    ))
                }
            }
        }

        let venue = self
            .stores
            .venues
            .insert(&input)
            .await
            .map_err(|e| match e {
                atlas_store::StoreError::AlreadyExists { .. } => {
                    RegistryError::already_exists(format!("venue {:?}", input.id))
                }
                other => other.into(),
            })?;

        self.publish(EventType::VenueCreated, &venue);
        Ok(venue)
    }

    pub async fn get_venue(&self, id: &str) -> Result<Venue> {
        let key = keys::venue(id);
        self.cached_fetch("venue", key, self.ttl.venue, || async move {
            Ok(self.stores.venues.get(id).await?)
        })
        .await?
        .ok_or_else(|| RegistryError::not_found(format!("venue {id}")))
    }

    pub async fn list_venues(
        &self,
        venue_type: Option<VenueType>,
        active_only: bool,
        page: PageRequest,
    ) -> Result<Page<Venue>> {
        self.cache.record_skip("venue");
        let items = self
            .stores
            .venues
            .list(venue_type, active_only, page.size(), page.offset())
            .await?;
        Ok(Page::from_request(items, &page))
    }

    pub async fn create_venue_asset(&self, input: NewVenueAsset) -> Result<VenueAsset> {
        let input = NewVenueAsset {
            venue_symbol: non_empty("venue_symbol", &input.venue_symbol)?,
            ..input
        };

        self.get_venue(&input.venue_id).await?;
        self.get_asset(input.asset_id).await?;
        if let Some(deployment_id) = input.deployment_id {
            let deployment = self.get_deployment(deployment_id).await?;
            if deployment.asset_id != input.asset_id {
                return Err(RegistryError::invalid(
                    "deployment_id",
                    "deployment belongs to a different asset",
                ));
            }
        }

        let venue_asset = self
            .stores
            .venue_assets
            .insert(&input)
            .await
            .map_err(|e| match e {
                atlas_store::StoreError::AlreadyExists { .. } => RegistryError::already_exists(
                    format!("venue asset {}:{}", input.venue_id, input.asset_id),
                ),
                other => other.into(),
            })?;

        self.publish(EventType::VenueAssetListed, &venue_asset);
        Ok(venue_asset)
    }

    pub async fn get_venue_asset(&self, venue_id: &str, asset_id: Uuid) -> Result<VenueAsset> {
        let key = keys::venue_asset(venue_id, asset_id);
        self.cached_fetch("venue_asset", key, self.ttl.venue_asset, || async move {
            Ok(self.stores.venue_assets.get(venue_id, asset_id).await?)
        })
        .await?
        .ok_or_else(|| RegistryError::not_found(format!("venue asset {venue_id}:{asset_id}")))
    }

    pub async fn list_venue_assets(
        &self,
        filter: VenueAssetFilter,
        page: PageRequest,
    ) -> Result<Page<VenueAsset>> {
        self.cache.record_skip("venue_asset");
        let items = self
            .stores
            .venue_assets
            .list(&filter, page.size(), page.offset())
            .await?;
        Ok(Page::from_request(items, &page))
    }
}
