//! Directed inter-asset relationships (wraps, stakes, bridges, ...).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::InvalidEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// `from` is a wrapped form of `to` (WETH wraps ETH).
    Wraps,
    /// `from` is a staked position in `to` (stETH stakes ETH).
    Stakes,
    /// `from` is a bridged representation of `to` on another chain.
    Bridges,
    /// `from` represents `to` without a redemption path.
    Represents,
    /// `from` is collateralized by `to`.
    Collateralizes,
    /// `from` is the migration successor of `to`.
    Migrates,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wraps => "wraps",
            Self::Stakes => "stakes",
            Self::Bridges => "bridges",
            Self::Represents => "represents",
            Self::Collateralizes => "collateralizes",
            Self::Migrates => "migrates",
        }
    }
}

impl FromStr for RelationshipType {
    type Err = InvalidEnum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wraps" => Ok(Self::Wraps),
            "stakes" => Ok(Self::Stakes),
            "bridges" => Ok(Self::Bridges),
            "represents" => Ok(Self::Represents),
            "collateralizes" => Ok(Self::Collateralizes),
            "migrates" => Ok(Self::Migrates),
            other => Err(InvalidEnum::new("relationship type", other)),
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge in the per-type relationship graph. The graph of each
/// relationship type must stay acyclic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: Uuid,
    pub from_asset_id: Uuid,
    pub to_asset_id: Uuid,
    pub relationship_type: RelationshipType,
    pub conversion_rate: Option<Decimal>,
    pub protocol: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRelationship {
    pub from_asset_id: Uuid,
    pub to_asset_id: Uuid,
    pub relationship_type: RelationshipType,
    #[serde(default)]
    pub conversion_rate: Option<Decimal>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipFilter {
    #[serde(default)]
    pub from_asset_id: Option<Uuid>,
    #[serde(default)]
    pub to_asset_id: Option<Uuid>,
    #[serde(default)]
    pub relationship_type: Option<RelationshipType>,
}
