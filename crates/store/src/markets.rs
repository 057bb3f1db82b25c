//! Market persistence. `(venue_id, venue_symbol)` is the hot-path lookup key
//! and is unique.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use atlas_model::{Market, MarketPatch, NewMarket};

use crate::error::Result;

const MARKET_COLUMNS: &str = "id, instrument_id, venue_id, venue_symbol, settlement_asset_id, \
     price_currency_id, tick_size, lot_size, min_order_size, max_order_size, min_notional, \
     maker_fee, taker_fee, funding_interval_secs, status, listed_at, delisted_at, \
     created_at, updated_at";

#[derive(Clone)]
pub struct MarketStore {
    pool: PgPool,
}

impl MarketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, id: Uuid, market: &NewMarket) -> Result<Market> {
        let row = sqlx::query(&format!(
            r#"
            insert into markets (id, instrument_id, venue_id, venue_symbol,
                                 settlement_asset_id, price_currency_id, tick_size,
                                 lot_size, min_order_size, max_order_size, min_notional,
                                 maker_fee, taker_fee, funding_interval_secs, listed_at)
            values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            returning {MARKET_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(market.instrument_id)
        .bind(&market.venue_id)
        .bind(&market.venue_symbol)
        .bind(market.settlement_asset_id)
        .bind(market.price_currency_id)
        .bind(market.tick_size)
        .bind(market.lot_size)
        .bind(market.min_order_size)
        .bind(market.max_order_size)
        .bind(market.min_notional)
        .bind(market.maker_fee)
        .bind(market.taker_fee)
        .bind(market.funding_interval_secs)
        .bind(market.listed_at)
        .fetch_one(&self.pool)
        .await?;

        map_market(&row)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Market>> {
        let row = sqlx::query(&format!("select {MARKET_COLUMNS} from markets where id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_market).transpose()
    }

    /// The resolver's durable lookup: one row by (venue, venue-local symbol).
    pub async fn get_by_venue_symbol(
        &self,
        venue_id: &str,
        venue_symbol: &str,
    ) -> Result<Option<Market>> {
        let row = sqlx::query(&format!(
            "select {MARKET_COLUMNS} from markets where venue_id = $1 and venue_symbol = $2",
        ))
        .bind(venue_id)
        .bind(venue_symbol)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_market).transpose()
    }

    pub async fn update(&self, id: Uuid, patch: &MarketPatch) -> Result<Option<Market>> {
        let row = sqlx::query(&format!(
            r#"
            update markets set
                tick_size             = coalesce($2, tick_size),
                lot_size              = coalesce($3, lot_size),
                min_order_size        = coalesce($4, min_order_size),
                max_order_size        = coalesce($5, max_order_size),
                min_notional          = coalesce($6, min_notional),
                maker_fee             = coalesce($7, maker_fee),
                taker_fee             = coalesce($8, taker_fee),
                funding_interval_secs = coalesce($9, funding_interval_secs),
                status                = coalesce($10, status),
                updated_at            = now()
            where id = $1
            returning {MARKET_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(patch.tick_size)
        .bind(patch.lot_size)
        .bind(patch.min_order_size)
        .bind(patch.max_order_size)
        .bind(patch.min_notional)
        .bind(patch.maker_fee)
        .bind(patch.taker_fee)
        .bind(patch.funding_interval_secs)
        .bind(&patch.status)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_market).transpose()
    }

    /// Marks a market delisted; idempotent on the already-delisted path.
    pub async fn delist(&self, id: Uuid) -> Result<Option<Market>> {
        let row = sqlx::query(&format!(
            r#"
            update markets set
                status      = 'delisted',
                delisted_at = coalesce(delisted_at, now()),
                updated_at  = now()
            where id = $1
            returning {MARKET_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_market).transpose()
    }

    pub async fn list_by_instrument(
        &self,
        instrument_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Market>> {
        let rows = sqlx::query(&format!(
            r#"
            select {MARKET_COLUMNS} from markets
            where instrument_id = $1
            order by venue_id, venue_symbol
            limit $2 offset $3
            "#,
        ))
        .bind(instrument_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_market).collect()
    }

    pub async fn list_by_venue(
        &self,
        venue_id: &str,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Market>> {
        let rows = sqlx::query(&format!(
            r#"
            select {MARKET_COLUMNS} from markets
            where venue_id = $1
              and ($2::text is null or status = $2)
            order by venue_symbol
            limit $3 offset $4
            "#,
        ))
        .bind(venue_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_market).collect()
    }
}

fn map_market(row: &PgRow) -> Result<Market> {
    Ok(Market {
        id: row.try_get("id")?,
        instrument_id: row.try_get("instrument_id")?,
        venue_id: row.try_get("venue_id")?,
        venue_symbol: row.try_get("venue_symbol")?,
        settlement_asset_id: row.try_get("settlement_asset_id")?,
        price_currency_id: row.try_get("price_currency_id")?,
        tick_size: row.try_get("tick_size")?,
        lot_size: row.try_get("lot_size")?,
        min_order_size: row.try_get("min_order_size")?,
        max_order_size: row.try_get("max_order_size")?,
        min_notional: row.try_get("min_notional")?,
        maker_fee: row.try_get("maker_fee")?,
        taker_fee: row.try_get("taker_fee")?,
        funding_interval_secs: row.try_get("funding_interval_secs")?,
        status: row.try_get("status")?,
        listed_at: row.try_get("listed_at")?,
        delisted_at: row.try_get("delisted_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
