//! Canonical assets: one logical token/currency identity, independent of the
//! chains it is deployed on and the venues it trades on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::InvalidEnum;

/// What kind of thing an asset is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Chain-native currency (ETH, BTC, SOL).
    Native,
    /// Fungible token in the chain family's dominant standard (ERC-20, SPL).
    FungibleToken,
    /// A family of non-fungible tokens under one contract.
    NftFamily,
    /// Synthetic exposure to some underlying.
    Synthetic,
    /// Liquidity-pool share token.
    LpToken,
    /// Receipt/claim token (aTokens, cTokens).
    Receipt,
    /// Wrapped representation of another asset.
    Wrapped,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::FungibleToken => "fungible_token",
            Self::NftFamily => "nft_family",
            Self::Synthetic => "synthetic",
            Self::LpToken => "lp_token",
            Self::Receipt => "receipt",
            Self::Wrapped => "wrapped",
        }
    }
}

impl FromStr for AssetType {
    type Err = InvalidEnum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(Self::Native),
            "fungible_token" => Ok(Self::FungibleToken),
            "nft_family" => Ok(Self::NftFamily),
            "synthetic" => Ok(Self::Synthetic),
            "lp_token" => Ok(Self::LpToken),
            "receipt" => Ok(Self::Receipt),
            "wrapped" => Ok(Self::Wrapped),
            other => Err(InvalidEnum::new("asset type", other)),
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical asset row.
///
/// The symbol is deliberately not unique: "USDC" exists on a dozen chains and
/// more than one issuer has used the ticker. Disambiguation happens through
/// deployments and identifiers, never through the symbol itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub symbol: String,
    pub name: String,
    pub asset_type: AssetType,
    pub category: Option<String>,
    pub description: Option<String>,
    pub media_url: Option<String>,
    pub homepage_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Asset {
    /// Soft-deleted assets stay in the table but are excluded from every
    /// standard query.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Input for creating an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAsset {
    pub symbol: String,
    pub name: String,
    pub asset_type: AssetType,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub homepage_url: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetPatch {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub homepage_url: Option<String>,
}

impl AssetPatch {
    pub fn is_empty(&self) -> bool {
        self.symbol.is_none()
            && self.name.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.media_url.is_none()
            && self.homepage_url.is_none()
    }
}

/// Enumerated list filters for assets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetFilter {
    #[serde(default)]
    pub asset_type: Option<AssetType>,
    #[serde(default)]
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_type_round_trips() {
        for t in [
            AssetType::Native,
            AssetType::FungibleToken,
            AssetType::NftFamily,
            AssetType::Synthetic,
            AssetType::LpToken,
            AssetType::Receipt,
            AssetType::Wrapped,
        ] {
            assert_eq!(t.as_str().parse::<AssetType>().unwrap(), t);
        }
    }

    #[test]
    fn asset_type_rejects_unknown() {
        let err = "stablecoin".parse::<AssetType>().unwrap_err();
        assert!(err.to_string().contains("stablecoin"));
    }

    #[test]
    fn patch_emptiness() {
        assert!(AssetPatch::default().is_empty());
        let patch = AssetPatch {
            name: Some("USD Coin".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
