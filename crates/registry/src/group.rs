//! Asset group operations.

use rust_decimal::Decimal;
use uuid::Uuid;

use atlas_model::{AssetGroup, EventType, GroupMember, NewGroup, Page, PageRequest};

use crate::asset::non_empty;
use crate::error::{RegistryError, Result};
use crate::registry::Registry;

impl Registry {
    pub async fn create_group(&self, input: NewGroup) -> Result<AssetGroup> {
        let input = NewGroup {
            name: non_empty("name", &input.name)?,
            ..input
        };

        let group = self
            .stores
            .groups
            .insert(Uuid::new_v4(), &input)
            .await
            .map_err(|e| match e {
                atlas_store::StoreError::AlreadyExists { .. } => {
                    RegistryError::already_exists(format!("group {:?}", input.name))
                }
                other => other.into(),
            })?;

        self.publish(EventType::GroupCreated, &group);
        Ok(group)
    }

    pub async fn get_group(&self, id: Uuid) -> Result<AssetGroup> {
        self.stores
            .groups
            .get(id)
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("group {id}")))
    }

    pub async fn get_group_by_name(&self, name: &str) -> Result<AssetGroup> {
        self.stores
            .groups
            .get_by_name(name)
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("group {name:?}")))
    }

    /// Adds an asset to a group. Weight defaults to 1.
    pub async fn add_group_member(
        &self,
        group_id: Uuid,
        asset_id: Uuid,
        weight: Option<Decimal>,
    ) -> Result<GroupMember> {
        let weight = weight.unwrap_or(Decimal::ONE);
        if weight <= Decimal::ZERO {
            return Err(RegistryError::invalid("weight", "must be positive"));
        }

        self.get_group(group_id).await?;
        self.get_asset(asset_id).await?;

        let member = self
            .stores
            .groups
            .add_member(group_id, asset_id, weight)
            .await
            .map_err(|e| match e {
                atlas_store::StoreError::AlreadyExists { .. } => RegistryError::already_exists(
                    format!("membership of {asset_id} in group {group_id}"),
                ),
                other => other.into(),
            })?;

        self.publish(EventType::GroupMemberAdded, &member);
        Ok(member)
    }

    /// Removing an absent member is a no-op, reported through the returned
    /// flag.
    pub async fn remove_group_member(&self, group_id: Uuid, asset_id: Uuid) -> Result<bool> {
        let removed = self.stores.groups.remove_member(group_id, asset_id).await?;
        if removed {
            self.publish(
                EventType::GroupMemberRemoved,
                &serde_json::json!({ "group_id": group_id, "asset_id": asset_id }),
            );
        }
        Ok(removed)
    }

    pub async fn list_groups(&self, page: PageRequest) -> Result<Page<AssetGroup>> {
        let items = self.stores.groups.list(page.size(), page.offset()).await?;
        Ok(Page::from_request(items, &page))
    }

    pub async fn list_group_members(&self, group_id: Uuid) -> Result<Vec<GroupMember>> {
        self.get_group(group_id).await?;
        Ok(self.stores.groups.list_members(group_id).await?)
    }
}
