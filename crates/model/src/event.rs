//! Domain events published after every successful mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Subject prefix on the event stream. Full subjects are
/// `atlas.events.v1.<event_type>`.
pub const EVENT_SUBJECT_PREFIX: &str = "atlas.events.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AssetCreated,
    AssetUpdated,
    AssetDeleted,
    ChainRegistered,
    DeploymentCreated,
    RelationshipEstablished,
    GroupCreated,
    GroupMemberAdded,
    GroupMemberRemoved,
    QualityFlagRaised,
    QualityFlagResolved,
    InstrumentCreated,
    MarketListed,
    MarketUpdated,
    MarketDelisted,
    VenueCreated,
    VenueAssetListed,
    IdentifierCreated,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssetCreated => "asset_created",
            Self::AssetUpdated => "asset_updated",
            Self::AssetDeleted => "asset_deleted",
            Self::ChainRegistered => "chain_registered",
            Self::DeploymentCreated => "deployment_created",
            Self::RelationshipEstablished => "relationship_established",
            Self::GroupCreated => "group_created",
            Self::GroupMemberAdded => "group_member_added",
            Self::GroupMemberRemoved => "group_member_removed",
            Self::QualityFlagRaised => "quality_flag_raised",
            Self::QualityFlagResolved => "quality_flag_resolved",
            Self::InstrumentCreated => "instrument_created",
            Self::MarketListed => "market_listed",
            Self::MarketUpdated => "market_updated",
            Self::MarketDelisted => "market_delisted",
            Self::VenueCreated => "venue_created",
            Self::VenueAssetListed => "venue_asset_listed",
            Self::IdentifierCreated => "identifier_created",
        }
    }

    /// Stream subject this event type is published on.
    pub fn subject(&self) -> String {
        format!("{}.{}", EVENT_SUBJECT_PREFIX, self.as_str())
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical event envelope. The payload is a JSON snapshot of the affected
/// entity as of the committed write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub occurred_at: DateTime<Utc>,
    pub producer: String,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Builds an envelope with a fresh event id, stamping `occurred_at` now.
    pub fn new<P: Serialize>(event_type: EventType, producer: &str, payload: &P) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            occurred_at: Utc::now(),
            producer: producer.to_string(),
            // Entity snapshots are plain serde structs; serialization cannot
            // fail for them.
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        }
    }

    pub fn subject(&self) -> String {
        self.event_type.subject()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subjects_follow_convention() {
        assert_eq!(
            EventType::QualityFlagRaised.subject(),
            "atlas.events.v1.quality_flag_raised"
        );
        assert_eq!(
            EventType::MarketListed.subject(),
            "atlas.events.v1.market_listed"
        );
    }

    #[test]
    fn envelope_snapshots_payload() {
        #[derive(Serialize)]
        struct Payload {
            symbol: &'static str,
        }
        let env = EventEnvelope::new(EventType::AssetCreated, "atlas-test", &Payload { symbol: "ETH" });
        assert_eq!(env.payload["symbol"], "ETH");
        assert_eq!(env.producer, "atlas-test");
    }

    #[test]
    fn envelope_round_trips_through_json() {
        let env = EventEnvelope::new(EventType::MarketDelisted, "atlas-test", &serde_json::json!({"id": 1}));
        let bytes = serde_json::to_vec(&env).unwrap();
        let back: EventEnvelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, env);
    }
}
