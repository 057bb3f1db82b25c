//! Venues and per-venue asset availability.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::InvalidEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueType {
    Cex,
    Dex,
    Aggregator,
    Bridge,
    Lending,
}

impl VenueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cex => "cex",
            Self::Dex => "dex",
            Self::Aggregator => "aggregator",
            Self::Bridge => "bridge",
            Self::Lending => "lending",
        }
    }

    /// On-chain venues are meaningless without knowing which chain they
    /// execute on.
    pub fn requires_chain(&self) -> bool {
        matches!(self, Self::Dex | Self::Bridge)
    }
}

impl FromStr for VenueType {
    type Err = InvalidEnum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cex" => Ok(Self::Cex),
            "dex" => Ok(Self::Dex),
            "aggregator" => Ok(Self::Aggregator),
            "bridge" => Ok(Self::Bridge),
            "lending" => Ok(Self::Lending),
            other => Err(InvalidEnum::new("venue type", other)),
        }
    }
}

impl fmt::Display for VenueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An execution/trading/lending place. The id is a short stable string
/// ("binance", "uniswap_v3").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub venue_type: VenueType,
    pub chain_id: Option<String>,
    pub protocol_address: Option<String>,
    pub api_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVenue {
    pub id: String,
    pub name: String,
    pub venue_type: VenueType,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub protocol_address: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
}

/// Availability of an asset on a venue, keyed by `(venue_id, asset_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueAsset {
    pub venue_id: String,
    pub asset_id: Uuid,
    pub venue_symbol: String,
    pub deployment_id: Option<Uuid>,
    pub deposit_enabled: bool,
    pub withdraw_enabled: bool,
    pub trading_enabled: bool,
    pub min_deposit: Option<Decimal>,
    pub min_withdraw: Option<Decimal>,
    pub deposit_fee: Option<Decimal>,
    pub withdraw_fee: Option<Decimal>,
    pub listed_at: Option<DateTime<Utc>>,
    pub delisted_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVenueAsset {
    pub venue_id: String,
    pub asset_id: Uuid,
    pub venue_symbol: String,
    #[serde(default)]
    pub deployment_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub deposit_enabled: bool,
    #[serde(default = "default_true")]
    pub withdraw_enabled: bool,
    #[serde(default = "default_true")]
    pub trading_enabled: bool,
    #[serde(default)]
    pub min_deposit: Option<Decimal>,
    #[serde(default)]
    pub min_withdraw: Option<Decimal>,
    #[serde(default)]
    pub deposit_fee: Option<Decimal>,
    #[serde(default)]
    pub withdraw_fee: Option<Decimal>,
    #[serde(default)]
    pub listed_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VenueAssetFilter {
    #[serde(default)]
    pub venue_id: Option<String>,
    #[serde(default)]
    pub asset_id: Option<Uuid>,
    #[serde(default)]
    pub trading_enabled: Option<bool>,
    #[serde(default)]
    pub active_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_type_round_trips() {
        for t in [
            VenueType::Cex,
            VenueType::Dex,
            VenueType::Aggregator,
            VenueType::Bridge,
            VenueType::Lending,
        ] {
            assert_eq!(t.as_str().parse::<VenueType>().unwrap(), t);
        }
    }

    #[test]
    fn onchain_venues_require_chain() {
        assert!(VenueType::Dex.requires_chain());
        assert!(VenueType::Bridge.requires_chain());
        assert!(!VenueType::Cex.requires_chain());
        assert!(!VenueType::Lending.requires_chain());
    }

    #[test]
    fn venue_asset_flags_default_enabled() {
        let va: NewVenueAsset = serde_json::from_value(serde_json::json!({
            "venue_id": "binance",
            "asset_id": Uuid::new_v4(),
            "venue_symbol": "ETH",
        }))
        .unwrap();
        assert!(va.deposit_enabled);
        assert!(va.withdraw_enabled);
        assert!(va.trading_enabled);
    }
}
