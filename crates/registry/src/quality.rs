//! The quality gate: flag lifecycle and the tradability question.

use uuid::Uuid;

use atlas_model::{EventType, FlagFilter, NewQualityFlag, Page, PageRequest, QualityFlag};

use crate::asset::non_empty;
use crate::cache::keys;
use crate::error::{RegistryError, Result};
use crate::registry::Registry;

impl Registry {
    pub async fn raise_flag(&self, input: NewQualityFlag) -> Result<QualityFlag> {
        let input = NewQualityFlag {
            source: non_empty("source", &input.source)?,
            reason: non_empty("reason", &input.reason)?,
            ..input
        };
        self.get_asset(input.asset_id).await?;

        let flag = self.stores.quality.insert(Uuid::new_v4(), &input).await?;

        self.invalidate("quality_flag", vec![keys::critical_flags(flag.asset_id)])
            .await;
        self.publish(EventType::QualityFlagRaised, &flag);
        Ok(flag)
    }

    /// One-way transition: an active flag becomes resolved. Resolving a
    /// resolved flag is a precondition failure, not an idempotent success —
    /// the caller's view of the flag state was stale.
    pub async fn resolve_flag(
        &self,
        id: Uuid,
        resolved_by: &str,
        resolution_notes: Option<&str>,
    ) -> Result<QualityFlag> {
        let resolved_by = non_empty("resolved_by", resolved_by)?;

        let resolved = self
            .stores
            .quality
            .resolve(id, &resolved_by, resolution_notes)
            .await?;
        let flag = match resolved {
            Some(flag) => flag,
            None => {
                return match self.stores.quality.get(id).await? {
                    Some(_) => Err(RegistryError::FailedPrecondition(format!(
                        "quality flag {id} is already resolved"
                    ))),
                    None => Err(RegistryError::not_found(format!("quality flag {id}"))),
                }
            }
        };

        self.invalidate("quality_flag", vec![keys::critical_flags(flag.asset_id)])
            .await;
        self.publish(EventType::QualityFlagResolved, &flag);
        Ok(flag)
    }

    pub async fn list_flags(
        &self,
        filter: FlagFilter,
        page: PageRequest,
    ) -> Result<Page<QualityFlag>> {
        self.cache.record_skip("quality_flag");
        let items = self
            .stores
            .quality
            .list(&filter, page.size(), page.offset())
            .await?;
        Ok(Page::from_request(items, &page))
    }

    /// An asset is tradable iff it carries no active critical flag. Served
    /// from a cached per-asset counter; reflects committed state within one
    /// quality-flag TTL of a change.
    pub async fn is_tradable(&self, asset_id: Uuid) -> Result<bool> {
        self.get_asset(asset_id).await?;

        let count = self
            .cached_fetch(
                "quality_flag",
                keys::critical_flags(asset_id),
                self.ttl.quality_flag,
                || async move {
                    Ok(Some(
                        self.stores.quality.count_active_critical(asset_id).await?,
                    ))
                },
            )
            .await?
            .unwrap_or(0);

        Ok(count == 0)
    }
}
