//! Asset persistence. Assets are soft-deleted: `deleted_at` is set and every
//! standard query filters it out.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use atlas_model::{Asset, AssetFilter, AssetPatch, NewAsset};

use crate::error::Result;
use crate::row::{escape_like, parse_enum};

const ASSET_COLUMNS: &str = "id, symbol, name, asset_type, category, description, \
     media_url, homepage_url, created_at, updated_at, deleted_at";

#[derive(Clone)]
pub struct AssetStore {
    pool: PgPool,
}

impl AssetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, id: Uuid, asset: &NewAsset) -> Result<Asset> {
        let row = sqlx::query(&format!(
            r#"
            insert into assets (id, symbol, name, asset_type, category,
                                description, media_url, homepage_url)
            values ($1, $2, $3, $4, $5, $6, $7, $8)
            returning {ASSET_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&asset.symbol)
        .bind(&asset.name)
        .bind(asset.asset_type.as_str())
        .bind(&asset.category)
        .bind(&asset.description)
        .bind(&asset.media_url)
        .bind(&asset.homepage_url)
        .fetch_one(&self.pool)
        .await?;

        map_asset(&row)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Asset>> {
        let row = sqlx::query(&format!(
            "select {ASSET_COLUMNS} from assets where id = $1 and deleted_at is null",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_asset).transpose()
    }

    /// Patch update; absent fields keep their current value. Returns `None`
    /// when the asset does not exist or is soft-deleted.
    pub async fn update(&self, id: Uuid, patch: &AssetPatch) -> Result<Option<Asset>> {
        let row = sqlx::query(&format!(
            r#"
            update assets set
                symbol       = coalesce($2, symbol),
                name         = coalesce($3, name),
                category     = coalesce($4, category),
                description  = coalesce($5, description),
                media_url    = coalesce($6, media_url),
                homepage_url = coalesce($7, homepage_url),
                updated_at   = now()
            where id = $1 and deleted_at is null
            returning {ASSET_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&patch.symbol)
        .bind(&patch.name)
        .bind(&patch.category)
        .bind(&patch.description)
        .bind(&patch.media_url)
        .bind(&patch.homepage_url)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_asset).transpose()
    }

    /// Soft delete. Idempotent on the missing/already-deleted path.
    pub async fn soft_delete(&self, id: Uuid) -> Result<Option<Asset>> {
        let row = sqlx::query(&format!(
            r#"
            update assets set deleted_at = now(), updated_at = now()
            where id = $1 and deleted_at is null
            returning {ASSET_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_asset).transpose()
    }

    pub async fn list(
        &self,
        filter: &AssetFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Asset>> {
        let rows = sqlx::query(&format!(
            r#"
            select {ASSET_COLUMNS} from assets
            where deleted_at is null
              and ($1::text is null or asset_type = $1)
              and ($2::text is null or category = $2)
            order by created_at, id
            limit $3 offset $4
            "#,
        ))
        .bind(filter.asset_type.map(|t| t.as_str()))
        .bind(&filter.category)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_asset).collect()
    }

    /// Case-insensitive substring search over symbol, name, and description.
    pub async fn search(
        &self,
        query: &str,
        filter: &AssetFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Asset>> {
        let pattern = format!("%{}%", escape_like(query));
        let rows = sqlx::query(&format!(
            r#"
            select {ASSET_COLUMNS} from assets
            where deleted_at is null
              and (symbol ilike $1 or name ilike $1 or coalesce(description, '') ilike $1)
              and ($2::text is null or asset_type = $2)
              and ($3::text is null or category = $3)
            order by symbol, id
            limit $4 offset $5
            "#,
        ))
        .bind(&pattern)
        .bind(filter.asset_type.map(|t| t.as_str()))
        .bind(&filter.category)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_asset).collect()
    }

    /// Other live assets carrying the same symbol, for collision reporting.
    pub async fn same_symbol(&self, symbol: &str, excluding: Uuid) -> Result<Vec<Asset>> {
        let rows = sqlx::query(&format!(
            r#"
            select {ASSET_COLUMNS} from assets
            where deleted_at is null and lower(symbol) = lower($1) and id <> $2
            order by created_at
            "#,
        ))
        .bind(symbol)
        .bind(excluding)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_asset).collect()
    }
}

fn map_asset(row: &PgRow) -> Result<Asset> {
    Ok(Asset {
        id: row.try_get("id")?,
        symbol: row.try_get("symbol")?,
        name: row.try_get("name")?,
        asset_type: parse_enum(row, "asset_type")?,
        category: row.try_get("category")?,
        description: row.try_get("description")?,
        media_url: row.try_get("media_url")?,
        homepage_url: row.try_get("homepage_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}
