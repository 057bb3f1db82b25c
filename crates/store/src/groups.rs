//! Asset group and membership persistence.

use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use atlas_model::{AssetGroup, GroupMember, NewGroup};

use crate::error::Result;

const GROUP_COLUMNS: &str = "id, name, description, created_at, updated_at";
const MEMBER_COLUMNS: &str = "group_id, asset_id, weight, created_at, updated_at";

#[derive(Clone)]
pub struct GroupStore {
    pool: PgPool,
}

impl GroupStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, id: Uuid, group: &NewGroup) -> Result<AssetGroup> {
        let row = sqlx::query(&format!(
            r#"
            insert into asset_groups (id, name, description)
            values ($1, $2, $3)
            returning {GROUP_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&group.name)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await?;

        map_group(&row)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<AssetGroup>> {
        let row = sqlx::query(&format!(
            "select {GROUP_COLUMNS} from asset_groups where id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_group).transpose()
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<AssetGroup>> {
        let row = sqlx::query(&format!(
            "select {GROUP_COLUMNS} from asset_groups where name = $1",
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_group).transpose()
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<AssetGroup>> {
        let rows = sqlx::query(&format!(
            "select {GROUP_COLUMNS} from asset_groups order by name limit $1 offset $2",
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_group).collect()
    }

    pub async fn add_member(
        &self,
        group_id: Uuid,
        asset_id: Uuid,
        weight: Decimal,
    ) -> Result<GroupMember> {
        let row = sqlx::query(&format!(
            r#"
            insert into group_members (group_id, asset_id, weight)
            values ($1, $2, $3)
            returning {MEMBER_COLUMNS}
            "#,
        ))
        .bind(group_id)
        .bind(asset_id)
        .bind(weight)
        .fetch_one(&self.pool)
        .await?;

        map_member(&row)
    }

    /// Returns whether a row was actually removed; removing an absent member
    /// is not an error.
    pub async fn remove_member(&self, group_id: Uuid, asset_id: Uuid) -> Result<bool> {
        let result = sqlx::query("delete from group_members where group_id = $1 and asset_id = $2")
            .bind(group_id)
            .bind(asset_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_members(&self, group_id: Uuid) -> Result<Vec<GroupMember>> {
        let rows = sqlx::query(&format!(
            "select {MEMBER_COLUMNS} from group_members where group_id = $1 order by asset_id",
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_member).collect()
    }
}

fn map_group(row: &PgRow) -> Result<AssetGroup> {
    Ok(AssetGroup {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_member(row: &PgRow) -> Result<GroupMember> {
    Ok(GroupMember {
        group_id: row.try_get("group_id")?,
        asset_id: row.try_get("asset_id")?,
        weight: row.try_get("weight")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
