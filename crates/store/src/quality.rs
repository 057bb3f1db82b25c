//! Quality flag persistence and the active-critical count backing the
//! tradability gate.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use atlas_model::{FlagFilter, NewQualityFlag, QualityFlag, Severity};

use crate::error::Result;
use crate::row::parse_enum;

const FLAG_COLUMNS: &str = "id, asset_id, flag_type, severity, source, reason, raised_at, \
     resolved_at, resolved_by, resolution_notes, created_at, updated_at";

#[derive(Clone)]
pub struct QualityFlagStore {
    pool: PgPool,
}

impl QualityFlagStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, id: Uuid, flag: &NewQualityFlag) -> Result<QualityFlag> {
        let row = sqlx::query(&format!(
            r#"
            insert into quality_flags (id, asset_id, flag_type, severity, source, reason)
            values ($1, $2, $3, $4, $5, $6)
            returning {FLAG_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(flag.asset_id)
        .bind(flag.flag_type.as_str())
        .bind(flag.severity.as_str())
        .bind(&flag.source)
        .bind(&flag.reason)
        .fetch_one(&self.pool)
        .await?;

        map_flag(&row)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<QualityFlag>> {
        let row = sqlx::query(&format!(
            "select {FLAG_COLUMNS} from quality_flags where id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_flag).transpose()
    }

    /// Marks an active flag resolved. Returns `None` when the flag is missing
    /// or already resolved; the caller distinguishes the two with `get`.
    pub async fn resolve(
        &self,
        id: Uuid,
        resolved_by: &str,
        resolution_notes: Option<&str>,
    ) -> Result<Option<QualityFlag>> {
        let row = sqlx::query(&format!(
            r#"
            update quality_flags set
                resolved_at = now(),
                resolved_by = $2,
                resolution_notes = $3,
                updated_at = now()
            where id = $1 and resolved_at is null
            returning {FLAG_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(resolved_by)
        .bind(resolution_notes)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_flag).transpose()
    }

    pub async fn list(
        &self,
        filter: &FlagFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<QualityFlag>> {
        let rows = sqlx::query(&format!(
            r#"
            select {FLAG_COLUMNS} from quality_flags
            where ($1::uuid is null or asset_id = $1)
              and ($2::text is null or flag_type = $2)
              and ($3::text is null or severity = $3)
              and (not $4 or resolved_at is null)
            order by raised_at desc, id
            limit $5 offset $6
            "#,
        ))
        .bind(filter.asset_id)
        .bind(filter.flag_type.map(|t| t.as_str()))
        .bind(filter.severity.map(|s| s.as_str()))
        .bind(filter.active_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_flag).collect()
    }

    /// Number of active critical flags on an asset. Zero means tradable.
    pub async fn count_active_critical(&self, asset_id: Uuid) -> Result<i64> {
        let row = sqlx::query(
            r#"
            select count(*) as n from quality_flags
            where asset_id = $1 and resolved_at is null and severity = $2
            "#,
        )
        .bind(asset_id)
        .bind(Severity::Critical.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("n")?)
    }
}

fn map_flag(row: &PgRow) -> Result<QualityFlag> {
    Ok(QualityFlag {
        id: row.try_get("id")?,
        asset_id: row.try_get("asset_id")?,
        flag_type: parse_enum(row, "flag_type")?,
        severity: parse_enum(row, "severity")?,
        source: row.try_get("source")?,
        reason: row.try_get("reason")?,
        raised_at: row.try_get("raised_at")?,
        resolved_at: row.try_get("resolved_at")?,
        resolved_by: row.try_get("resolved_by")?,
        resolution_notes: row.try_get("resolution_notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
