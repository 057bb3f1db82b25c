//! Chain persistence.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use atlas_model::{Chain, ChainFilter, NewChain};

use crate::error::Result;
use crate::row::parse_enum;

const CHAIN_COLUMNS: &str = "id, name, family, native_asset_id, explorer_url, \
     rpc_urls, is_testnet, created_at, updated_at";

#[derive(Clone)]
pub struct ChainStore {
    pool: PgPool,
}

impl ChainStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, chain: &NewChain) -> Result<Chain> {
        let row = sqlx::query(&format!(
            r#"
            insert into chains (id, name, family, native_asset_id, explorer_url,
                                rpc_urls, is_testnet)
            values ($1, $2, $3, $4, $5, $6, $7)
            returning {CHAIN_COLUMNS}
            "#,
        ))
        .bind(&chain.id)
        .bind(&chain.name)
        .bind(chain.family.as_str())
        .bind(chain.native_asset_id)
        .bind(&chain.explorer_url)
        .bind(&chain.rpc_urls)
        .bind(chain.is_testnet)
        .fetch_one(&self.pool)
        .await?;

        map_chain(&row)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Chain>> {
        let row = sqlx::query(&format!("select {CHAIN_COLUMNS} from chains where id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_chain).transpose()
    }

    pub async fn list(
        &self,
        filter: &ChainFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Chain>> {
        let rows = sqlx::query(&format!(
            r#"
            select {CHAIN_COLUMNS} from chains
            where ($1::text is null or family = $1)
              and ($2::boolean is null or is_testnet = $2)
            order by id
            limit $3 offset $4
            "#,
        ))
        .bind(filter.family.map(|f| f.as_str()))
        .bind(filter.is_testnet)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_chain).collect()
    }
}

fn map_chain(row: &PgRow) -> Result<Chain> {
    Ok(Chain {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        family: parse_enum(row, "family")?,
        native_asset_id: row.try_get("native_asset_id")?,
        explorer_url: row.try_get("explorer_url")?,
        rpc_urls: row.try_get("rpc_urls")?,
        is_testnet: row.try_get("is_testnet")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
