//! On-chain deployments of an asset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One concrete on-chain manifestation of an asset: a (chain, contract
/// address) pair plus its local precision. `(chain_id, address)` is unique
/// across the whole registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub chain_id: String,
    pub address: String,
    pub decimals: i16,
    pub is_canonical: bool,
    pub deployed_at_block: Option<i64>,
    pub deployed_at: Option<DateTime<Utc>>,
    pub deployer_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeployment {
    pub asset_id: Uuid,
    pub chain_id: String,
    pub address: String,
    pub decimals: i16,
    #[serde(default)]
    pub is_canonical: bool,
    #[serde(default)]
    pub deployed_at_block: Option<i64>,
    #[serde(default)]
    pub deployed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deployer_address: Option<String>,
}

/// Token decimals the registry will accept. 18 covers every EVM-era token;
/// anything above it is an ingestion error.
pub const MAX_DECIMALS: i16 = 18;
