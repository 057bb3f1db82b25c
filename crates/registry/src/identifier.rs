//! External identifier operations.

use uuid::Uuid;

use atlas_model::{EntityRef, EntityType, EventType, Identifier, NewIdentifier, Page, PageRequest};

use crate::asset::non_empty;
use crate::cache::keys;
use crate::error::{RegistryError, Result};
use crate::registry::Registry;

impl Registry {
    pub async fn create_identifier(&self, input: NewIdentifier) -> Result<Identifier> {
        if let Some(field) = input.coherence_error() {
            return Err(RegistryError::invalid(
                field,
                "exactly one entity id must be set and match entity_type",
            ));
        }
        let input = NewIdentifier {
            source: non_empty("source", &input.source)?.to_lowercase(),
            external_id: non_empty("external_id", &input.external_id)?,
            ..input
        };
        if !self
            .options
            .identifier_sources
            .iter()
            .any(|s| s == &input.source)
        {
            return Err(RegistryError::invalid(
                "source",
                format!("unrecognized source {:?}", input.source),
            ));
        }

        // The referenced entity must exist before the mapping does. Coherence
        // was checked above, so exactly one of these arms fires.
        match input.entity_type {
            EntityType::Asset => {
                if let Some(asset_id) = input.asset_id {
                    self.get_asset(asset_id).await?;
                }
            }
            EntityType::Instrument => {
                if let Some(instrument_id) = input.instrument_id {
                    self.get_instrument(instrument_id).await?;
                }
            }
            EntityType::Market => {
                if let Some(market_id) = input.market_id {
                    self.get_market(market_id).await?;
                }
            }
        }

        let identifier = self
            .stores
            .identifiers
            .insert(Uuid::new_v4(), &input)
            .await
            .map_err(|e| match e {
                atlas_store::StoreError::AlreadyExists { .. } => RegistryError::already_exists(
                    format!("identifier {}:{}", input.source, input.external_id),
                ),
                other => other.into(),
            })?;

        self.publish(EventType::IdentifierCreated, &identifier);
        Ok(identifier)
    }

    pub async fn get_identifier(&self, id: Uuid) -> Result<Identifier> {
        self.stores
            .identifiers
            .get(id)
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("identifier {id}")))
    }

    /// The provider's name for an entity, back to the local reference.
    /// Cache-aside: external ids are stable once verified.
    pub async fn resolve_external_id(
        &self,
        source: &str,
        external_id: &str,
    ) -> Result<(Identifier, EntityRef)> {
        let source = source.to_lowercase();
        let key = keys::identifier(&source, external_id);
        let lookup_source = source.clone();
        let identifier = self
            .cached_fetch("identifier", key, self.ttl.identifier, || async move {
                Ok(self
                    .stores
                    .identifiers
                    .get_by_external(&lookup_source, external_id)
                    .await?)
            })
            .await?
            .ok_or_else(|| {
                RegistryError::not_found(format!("identifier {source}:{external_id}"))
            })?;

        let entity = identifier.entity().ok_or_else(|| {
            RegistryError::Internal(format!(
                "identifier {} has no coherent entity reference",
                identifier.id
            ))
        })?;
        Ok((identifier, entity))
    }

    pub async fn list_identifiers_by_entity(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<Vec<Identifier>> {
        self.cache.record_skip("identifier");
        Ok(self
            .stores
            .identifiers
            .list_by_entity(entity_type, entity_id)
            .await?)
    }

    pub async fn list_identifiers_by_source(
        &self,
        source: &str,
        page: PageRequest,
    ) -> Result<Page<Identifier>> {
        self.cache.record_skip("identifier");
        let items = self
            .stores
            .identifiers
            .list_by_source(&source.to_lowercase(), page.size(), page.offset())
            .await?;
        Ok(Page::from_request(items, &page))
    }
}
