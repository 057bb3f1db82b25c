//! Venue persistence.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use atlas_model::{NewVenue, Venue, VenueType};

use crate::error::Result;
use crate::row::parse_enum;

const VENUE_COLUMNS: &str = "id, name, venue_type, chain_id, protocol_address, api_url, \
     is_active, created_at, updated_at";

#[derive(Clone)]
pub struct VenueStore {
    pool: PgPool,
}

impl VenueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, venue: &NewVenue) -> Result<Venue> {
        let row = sqlx::query(&format!(
            r#"
            insert into venues (id, name, venue_type, chain_id, protocol_address, api_url)
            values ($1, $2, $3, $4, $5, $6)
            returning {VENUE_COLUMNS}
            "#,
        ))
        .bind(&venue.id)
        .bind(&venue.name)
        .bind(venue.venue_type.as_str())
        .bind(&venue.chain_id)
        .bind(&venue.protocol_address)
        .bind(&venue.api_url)
        .fetch_one(&self.pool)
        .await?;

        map_venue(&row)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Venue>> {
        let row = sqlx::query(&format!("select {VENUE_COLUMNS} from venues where id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_venue).transpose()
    }

    pub async fn list(
        &self,
        venue_type: Option<VenueType>,
        active_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Venue>> {
        let rows = sqlx::query(&format!(
            r#"
            select {VENUE_COLUMNS} from venues
            where ($1::text is null or venue_type = $1)
              and (not $2 or is_active)
            order by id
            limit $3 offset $4
            "#,
        ))
        .bind(venue_type.map(|t| t.as_str()))
        .bind(active_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_venue).collect()
    }
}

fn map_venue(row: &PgRow) -> Result<Venue> {
    Ok(Venue {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        venue_type: parse_enum(row, "venue_type")?,
        chain_id: row.try_get("chain_id")?,
        protocol_address: row.try_get("protocol_address")?,
        api_url: row.try_get("api_url")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
