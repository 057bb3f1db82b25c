//! Unified external-id mapping: a `(source, external_id)` pair pointing at
//! exactly one local entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::InvalidEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Asset,
    Instrument,
    Market,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Instrument => "instrument",
            Self::Market => "market",
        }
    }
}

impl FromStr for EntityType {
    type Err = InvalidEnum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asset" => Ok(Self::Asset),
            "instrument" => Ok(Self::Instrument),
            "market" => Ok(Self::Market),
            other => Err(InvalidEnum::new("entity type", other)),
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The local entity an identifier points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub entity_id: Uuid,
}

/// An external provider's name for one of our entities. Exactly one of the
/// three id columns is populated, matching `entity_type`; `(source,
/// external_id)` is globally unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub id: Uuid,
    pub entity_type: EntityType,
    pub asset_id: Option<Uuid>,
    pub instrument_id: Option<Uuid>,
    pub market_id: Option<Uuid>,
    pub source: String,
    pub external_id: String,
    pub is_primary: bool,
    pub metadata: Option<serde_json::Value>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identifier {
    /// The populated entity reference. Relies on the store's coherence
    /// constraint; a row violating it is surfaced as a decode error there.
    pub fn entity(&self) -> Option<EntityRef> {
        let entity_id = match self.entity_type {
            EntityType::Asset => self.asset_id,
            EntityType::Instrument => self.instrument_id,
            EntityType::Market => self.market_id,
        }?;
        Some(EntityRef {
            entity_type: self.entity_type,
            entity_id,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIdentifier {
    pub entity_type: EntityType,
    #[serde(default)]
    pub asset_id: Option<Uuid>,
    #[serde(default)]
    pub instrument_id: Option<Uuid>,
    #[serde(default)]
    pub market_id: Option<Uuid>,
    pub source: String,
    pub external_id: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl NewIdentifier {
    /// Checks that exactly one id column is populated and that it matches the
    /// declared entity type. Returns the offending field name on mismatch.
    pub fn coherence_error(&self) -> Option<&'static str> {
        let populated = [
            self.asset_id.is_some(),
            self.instrument_id.is_some(),
            self.market_id.is_some(),
        ]
        .iter()
        .filter(|p| **p)
        .count();
        if populated != 1 {
            return Some("entity_id");
        }
        let matches = match self.entity_type {
            EntityType::Asset => self.asset_id.is_some(),
            EntityType::Instrument => self.instrument_id.is_some(),
            EntityType::Market => self.market_id.is_some(),
        };
        if matches {
            None
        } else {
            Some("entity_type")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> NewIdentifier {
        NewIdentifier {
            entity_type: EntityType::Asset,
            asset_id: Some(Uuid::new_v4()),
            instrument_id: None,
            market_id: None,
            source: "coingecko".to_string(),
            external_id: "usd-coin".to_string(),
            is_primary: false,
            metadata: None,
        }
    }

    #[test]
    fn coherent_identifier_passes() {
        assert_eq!(base().coherence_error(), None);
    }

    #[test]
    fn two_ids_fail() {
        let mut id = base();
        id.instrument_id = Some(Uuid::new_v4());
        assert_eq!(id.coherence_error(), Some("entity_id"));
    }

    #[test]
    fn no_ids_fail() {
        let mut id = base();
        id.asset_id = None;
        assert_eq!(id.coherence_error(), Some("entity_id"));
    }

    #[test]
    fn mismatched_type_fails() {
        let mut id = base();
        id.entity_type = EntityType::Market;
        assert_eq!(id.coherence_error(), Some("entity_type"));
    }
}
