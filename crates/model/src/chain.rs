//! Chains a deployment can live on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::InvalidEnum;

/// Address/account model family of a chain. Drives contract-address syntax
/// validation on deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainFamily {
    Evm,
    Utxo,
    Svm,
    NonEvm,
}

impl ChainFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evm => "evm",
            Self::Utxo => "utxo",
            Self::Svm => "svm",
            Self::NonEvm => "non_evm",
        }
    }
}

impl FromStr for ChainFamily {
    type Err = InvalidEnum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "evm" => Ok(Self::Evm),
            "utxo" => Ok(Self::Utxo),
            "svm" => Ok(Self::Svm),
            "non_evm" => Ok(Self::NonEvm),
            other => Err(InvalidEnum::new("chain family", other)),
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chain row. The id is a short stable string ("ethereum", "polygon_pos")
/// chosen once and never recycled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub id: String,
    pub name: String,
    pub family: ChainFamily,
    pub native_asset_id: Option<Uuid>,
    pub explorer_url: Option<String>,
    pub rpc_urls: Vec<String>,
    pub is_testnet: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChain {
    pub id: String,
    pub name: String,
    pub family: ChainFamily,
    #[serde(default)]
    pub native_asset_id: Option<Uuid>,
    #[serde(default)]
    pub explorer_url: Option<String>,
    #[serde(default)]
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub is_testnet: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainFilter {
    #[serde(default)]
    pub family: Option<ChainFamily>,
    #[serde(default)]
    pub is_testnet: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_round_trips() {
        for f in [
            ChainFamily::Evm,
            ChainFamily::Utxo,
            ChainFamily::Svm,
            ChainFamily::NonEvm,
        ] {
            assert_eq!(f.as_str().parse::<ChainFamily>().unwrap(), f);
        }
    }
}
