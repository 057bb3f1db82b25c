//! Deployment persistence. `(chain_id, address)` is unique; duplicates
//! surface as `StoreError::AlreadyExists`.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use atlas_model::{Deployment, NewDeployment};

use crate::error::Result;

const DEPLOYMENT_COLUMNS: &str = "id, asset_id, chain_id, address, decimals, is_canonical, \
     deployed_at_block, deployed_at, deployer_address, created_at, updated_at";

#[derive(Clone)]
pub struct DeploymentStore {
    pool: PgPool,
}

impl DeploymentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, id: Uuid, deployment: &NewDeployment) -> Result<Deployment> {
        let row = sqlx::query(&format!(
            r#"
            insert into deployments (id, asset_id, chain_id, address, decimals,
                                     is_canonical, deployed_at_block, deployed_at,
                                     deployer_address)
            values ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            returning {DEPLOYMENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(deployment.asset_id)
        .bind(&deployment.chain_id)
        .bind(&deployment.address)
        .bind(deployment.decimals)
        .bind(deployment.is_canonical)
        .bind(deployment.deployed_at_block)
        .bind(deployment.deployed_at)
        .bind(&deployment.deployer_address)
        .fetch_one(&self.pool)
        .await?;

        map_deployment(&row)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Deployment>> {
        let row = sqlx::query(&format!(
            "select {DEPLOYMENT_COLUMNS} from deployments where id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_deployment).transpose()
    }

    /// The asset-resolution path: chain + contract address to deployment.
    pub async fn get_by_chain_address(
        &self,
        chain_id: &str,
        address: &str,
    ) -> Result<Option<Deployment>> {
        let row = sqlx::query(&format!(
            "select {DEPLOYMENT_COLUMNS} from deployments where chain_id = $1 and address = $2",
        ))
        .bind(chain_id)
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_deployment).transpose()
    }

    pub async fn list_by_asset(&self, asset_id: Uuid) -> Result<Vec<Deployment>> {
        let rows = sqlx::query(&format!(
            "select {DEPLOYMENT_COLUMNS} from deployments where asset_id = $1 order by chain_id",
        ))
        .bind(asset_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_deployment).collect()
    }

    pub async fn list_by_chain(
        &self,
        chain_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Deployment>> {
        let rows = sqlx::query(&format!(
            r#"
            select {DEPLOYMENT_COLUMNS} from deployments
            where chain_id = $1
            order by created_at, id
            limit $2 offset $3
            "#,
        ))
        .bind(chain_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_deployment).collect()
    }
}

fn map_deployment(row: &PgRow) -> Result<Deployment> {
    Ok(Deployment {
        id: row.try_get("id")?,
        asset_id: row.try_get("asset_id")?,
        chain_id: row.try_get("chain_id")?,
        address: row.try_get("address")?,
        decimals: row.try_get("decimals")?,
        is_canonical: row.try_get("is_canonical")?,
        deployed_at_block: row.try_get("deployed_at_block")?,
        deployed_at: row.try_get("deployed_at")?,
        deployer_address: row.try_get("deployer_address")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
