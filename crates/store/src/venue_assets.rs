//! Per-venue asset availability persistence.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use atlas_model::{NewVenueAsset, VenueAsset, VenueAssetFilter};

use crate::error::Result;

const VENUE_ASSET_COLUMNS: &str = "venue_id, asset_id, venue_symbol, deployment_id, \
     deposit_enabled, withdraw_enabled, trading_enabled, min_deposit, min_withdraw, \
     deposit_fee, withdraw_fee, listed_at, delisted_at, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct VenueAssetStore {
    pool: PgPool,
}

impl VenueAssetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, va: &NewVenueAsset) -> Result<VenueAsset> {
        let row = sqlx::query(&format!(
            r#"
            insert into venue_assets (venue_id, asset_id, venue_symbol, deployment_id,
                                      deposit_enabled, withdraw_enabled, trading_enabled,
                                      min_deposit, min_withdraw, deposit_fee, withdraw_fee,
                                      listed_at)
            values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            returning {VENUE_ASSET_COLUMNS}
            "#,
        ))
        .bind(&va.venue_id)
        .bind(va.asset_id)
        .bind(&va.venue_symbol)
        .bind(va.deployment_id)
        .bind(va.deposit_enabled)
        .bind(va.withdraw_enabled)
        .bind(va.trading_enabled)
        .bind(va.min_deposit)
        .bind(va.min_withdraw)
        .bind(va.deposit_fee)
        .bind(va.withdraw_fee)
        .bind(va.listed_at)
        .fetch_one(&self.pool)
        .await?;

        map_venue_asset(&row)
    }

    pub async fn get(&self, venue_id: &str, asset_id: Uuid) -> Result<Option<VenueAsset>> {
        let row = sqlx::query(&format!(
            "select {VENUE_ASSET_COLUMNS} from venue_assets where venue_id = $1 and asset_id = $2",
        ))
        .bind(venue_id)
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_venue_asset).transpose()
    }

    pub async fn list(
        &self,
        filter: &VenueAssetFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VenueAsset>> {
        let rows = sqlx::query(&format!(
            r#"
            select {VENUE_ASSET_COLUMNS} from venue_assets
            where ($1::text is null or venue_id = $1)
              and ($2::uuid is null or asset_id = $2)
              and ($3::boolean is null or trading_enabled = $3)
              and (not $4 or is_active)
            order by venue_id, venue_symbol
            limit $5 offset $6
            "#,
        ))
        .bind(&filter.venue_id)
        .bind(filter.asset_id)
        .bind(filter.trading_enabled)
        .bind(filter.active_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_venue_asset).collect()
    }
}

fn map_venue_asset(row: &PgRow) -> Result<VenueAsset> {
    Ok(VenueAsset {
        venue_id: row.try_get("venue_id")?,
        asset_id: row.try_get("asset_id")?,
        venue_symbol: row.try_get("venue_symbol")?,
        deployment_id: row.try_get("deployment_id")?,
        deposit_enabled: row.try_get("deposit_enabled")?,
        withdraw_enabled: row.try_get("withdraw_enabled")?,
        trading_enabled: row.try_get("trading_enabled")?,
        min_deposit: row.try_get("min_deposit")?,
        min_withdraw: row.try_get("min_withdraw")?,
        deposit_fee: row.try_get("deposit_fee")?,
        withdraw_fee: row.try_get("withdraw_fee")?,
        listed_at: row.try_get("listed_at")?,
        delisted_at: row.try_get("delisted_at")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
