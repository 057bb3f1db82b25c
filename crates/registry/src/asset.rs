//! Asset operations.

use uuid::Uuid;

use atlas_model::{Asset, AssetFilter, AssetPatch, EventType, NewAsset, Page, PageRequest};

use crate::cache::keys;
use crate::error::{RegistryError, Result};
use crate::registry::Registry;

/// A freshly created asset plus any other live assets carrying the same
/// symbol. Symbols collide across chains by design; the collision list is
/// informational, for operator disambiguation.
#[derive(Debug, Clone)]
pub struct CreatedAsset {
    pub asset: Asset,
    pub symbol_collisions: Vec<Asset>,
}

impl Registry {
    pub async fn create_asset(&self, input: NewAsset) -> Result<CreatedAsset> {
        let input = NewAsset {
            symbol: non_empty("symbol", &input.symbol)?,
            name: non_empty("name", &input.name)?,
            ..input
        };

        let asset = self.stores.assets.insert(Uuid::new_v4(), &input).await?;
        let symbol_collisions = Self::best_effort(
            self.stores
                .assets
                .same_symbol(&asset.symbol, asset.id)
                .await
                .map_err(Into::into),
            "symbol collision",
        );

        self.publish(EventType::AssetCreated, &asset);
        Ok(CreatedAsset {
            asset,
            symbol_collisions,
        })
    }

    pub async fn get_asset(&self, id: Uuid) -> Result<Asset> {
        self.cached_fetch("asset", keys::asset(id), self.ttl.asset, || async move {
            Ok(self.stores.assets.get(id).await?)
        })
        .await?
        .ok_or_else(|| RegistryError::not_found(format!("asset {id}")))
    }

    pub async fn update_asset(&self, id: Uuid, patch: AssetPatch) -> Result<Asset> {
        if let Some(symbol) = &patch.symbol {
            non_empty("symbol", symbol)?;
        }
        if let Some(name) = &patch.name {
            non_empty("name", name)?;
        }

        let updated = self
            .stores
            .assets
            .update(id, &patch)
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("asset {id}")))?;

        self.invalidate("asset", vec![keys::asset(id)]).await;
        self.publish(EventType::AssetUpdated, &updated);
        Ok(updated)
    }

    /// Soft delete. The row stays for audit; owned children go with it only
    /// on a later hard purge.
    pub async fn delete_asset(&self, id: Uuid) -> Result<Asset> {
        let deleted = self
            .stores
            .assets
            .soft_delete(id)
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("asset {id}")))?;

        self.invalidate(
            "asset",
            vec![keys::asset(id), keys::critical_flags(id)],
        )
        .await;
        self.publish(EventType::AssetDeleted, &deleted);
        Ok(deleted)
    }

    pub async fn list_assets(
        &self,
        filter: AssetFilter,
        page: PageRequest,
    ) -> Result<Page<Asset>> {
        self.cache.record_skip("asset");
        let items = self
            .stores
            .assets
            .list(&filter, page.size(), page.offset())
            .await?;
        Ok(Page::from_request(items, &page))
    }

    /// Case-insensitive substring search over symbol, name, and description.
    /// Always bypasses the cache.
    pub async fn search_assets(
        &self,
        query: &str,
        filter: AssetFilter,
        page: PageRequest,
    ) -> Result<Page<Asset>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(RegistryError::invalid("query", "must not be empty"));
        }

        self.cache.record_skip("asset");
        let items = self
            .stores
            .assets
            .search(query, &filter, page.size(), page.offset())
            .await?;
        Ok(Page::from_request(items, &page))
    }
}

pub(crate) fn non_empty(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::invalid(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_trims_and_rejects_blank() {
        assert_eq!(non_empty("symbol", "  ETH ").unwrap(), "ETH");
        let err = non_empty("symbol", "   ").unwrap_err();
        assert_eq!(err.field(), Some("symbol"));
    }
}
