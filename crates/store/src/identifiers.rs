//! External identifier persistence. `(source, external_id)` is globally
//! unique; coherence between `entity_type` and the populated id column is a
//! table constraint.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use atlas_model::{EntityType, Identifier, NewIdentifier};

use crate::error::Result;
use crate::row::parse_enum;

const IDENTIFIER_COLUMNS: &str = "id, entity_type, asset_id, instrument_id, market_id, \
     source, external_id, is_primary, metadata, verified_at, created_at, updated_at";

#[derive(Clone)]
pub struct IdentifierStore {
    pool: PgPool,
}

impl IdentifierStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, id: Uuid, identifier: &NewIdentifier) -> Result<Identifier> {
        let row = sqlx::query(&format!(
            r#"
            insert into identifiers (id, entity_type, asset_id, instrument_id, market_id,
                                     source, external_id, is_primary, metadata)
            values ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            returning {IDENTIFIER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(identifier.entity_type.as_str())
        .bind(identifier.asset_id)
        .bind(identifier.instrument_id)
        .bind(identifier.market_id)
        .bind(&identifier.source)
        .bind(&identifier.external_id)
        .bind(identifier.is_primary)
        .bind(&identifier.metadata)
        .fetch_one(&self.pool)
        .await?;

        map_identifier(&row)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Identifier>> {
        let row = sqlx::query(&format!(
            "select {IDENTIFIER_COLUMNS} from identifiers where id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_identifier).transpose()
    }

    /// External-id resolution: the provider's name for an entity, back to
    /// the local row.
    pub async fn get_by_external(
        &self,
        source: &str,
        external_id: &str,
    ) -> Result<Option<Identifier>> {
        let row = sqlx::query(&format!(
            "select {IDENTIFIER_COLUMNS} from identifiers where source = $1 and external_id = $2",
        ))
        .bind(source)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_identifier).transpose()
    }

    pub async fn list_by_entity(
        &self,
        entity_type: EntityType,
        entity_id: Uuid,
    ) -> Result<Vec<Identifier>> {
        let column = match entity_type {
            EntityType::Asset => "asset_id",
            EntityType::Instrument => "instrument_id",
            EntityType::Market => "market_id",
        };
        let rows = sqlx::query(&format!(
            "select {IDENTIFIER_COLUMNS} from identifiers where {column} = $1 order by source, external_id",
        ))
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_identifier).collect()
    }

    pub async fn list_by_source(
        &self,
        source: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Identifier>> {
        let rows = sqlx::query(&format!(
            r#"
            select {IDENTIFIER_COLUMNS} from identifiers
            where source = $1
            order by external_id
            limit $2 offset $3
            "#,
        ))
        .bind(source)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_identifier).collect()
    }
}

fn map_identifier(row: &PgRow) -> Result<Identifier> {
    Ok(Identifier {
        id: row.try_get("id")?,
        entity_type: parse_enum(row, "entity_type")?,
        asset_id: row.try_get("asset_id")?,
        instrument_id: row.try_get("instrument_id")?,
        market_id: row.try_get("market_id")?,
        source: row.try_get("source")?,
        external_id: row.try_get("external_id")?,
        is_primary: row.try_get("is_primary")?,
        metadata: row.try_get("metadata")?,
        verified_at: row.try_get("verified_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
