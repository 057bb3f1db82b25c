//! Relationship persistence. The self-reference check is enforced here by a
//! table constraint; acyclicity is a manager concern built on `edges_of_type`.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use atlas_model::{NewRelationship, Relationship, RelationshipFilter, RelationshipType};

use crate::error::Result;
use crate::row::parse_enum;

const RELATIONSHIP_COLUMNS: &str = "id, from_asset_id, to_asset_id, relationship_type, \
     conversion_rate, protocol, description, created_at, updated_at";

#[derive(Clone)]
pub struct RelationshipStore {
    pool: PgPool,
}

impl RelationshipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, id: Uuid, rel: &NewRelationship) -> Result<Relationship> {
        let row = sqlx::query(&format!(
            r#"
            insert into relationships (id, from_asset_id, to_asset_id,
                                       relationship_type, conversion_rate,
                                       protocol, description)
            values ($1, $2, $3, $4, $5, $6, $7)
            returning {RELATIONSHIP_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(rel.from_asset_id)
        .bind(rel.to_asset_id)
        .bind(rel.relationship_type.as_str())
        .bind(rel.conversion_rate)
        .bind(&rel.protocol)
        .bind(&rel.description)
        .fetch_one(&self.pool)
        .await?;

        map_relationship(&row)
    }

    pub async fn list(
        &self,
        filter: &RelationshipFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Relationship>> {
        let rows = sqlx::query(&format!(
            r#"
            select {RELATIONSHIP_COLUMNS} from relationships
            where ($1::uuid is null or from_asset_id = $1)
              and ($2::uuid is null or to_asset_id = $2)
              and ($3::text is null or relationship_type = $3)
            order by created_at, id
            limit $4 offset $5
            "#,
        ))
        .bind(filter.from_asset_id)
        .bind(filter.to_asset_id)
        .bind(filter.relationship_type.map(|t| t.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_relationship).collect()
    }

    /// All directed edges of one relationship type, for cycle detection.
    pub async fn edges_of_type(&self, rel_type: RelationshipType) -> Result<Vec<(Uuid, Uuid)>> {
        let rows = sqlx::query(
            "select from_asset_id, to_asset_id from relationships where relationship_type = $1",
        )
        .bind(rel_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok((row.try_get("from_asset_id")?, row.try_get("to_asset_id")?)))
            .collect()
    }
}

fn map_relationship(row: &PgRow) -> Result<Relationship> {
    Ok(Relationship {
        id: row.try_get("id")?,
        from_asset_id: row.try_get("from_asset_id")?,
        to_asset_id: row.try_get("to_asset_id")?,
        relationship_type: parse_enum(row, "relationship_type")?,
        conversion_rate: row.try_get("conversion_rate")?,
        protocol: row.try_get("protocol")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
