//! Canonical reference-data model for AssetAtlas.
//!
//! Plain serde types shared by the store, the registry, and the transport.
//! Database and cache concerns live elsewhere; these types only know how to
//! represent entities and how to print/parse their closed enum sets.

pub mod asset;
pub mod chain;
pub mod deployment;
pub mod event;
pub mod group;
pub mod identifier;
pub mod instrument;
pub mod market;
pub mod page;
pub mod quality;
pub mod relationship;
pub mod venue;

pub use asset::{Asset, AssetFilter, AssetPatch, AssetType, NewAsset};
pub use chain::{Chain, ChainFamily, ChainFilter, NewChain};
pub use deployment::{Deployment, NewDeployment};
pub use event::{EventEnvelope, EventType};
pub use group::{AssetGroup, GroupMember, NewGroup};
pub use identifier::{EntityRef, EntityType, Identifier, NewIdentifier};
pub use instrument::{
    FutureContract, Instrument, InstrumentDetail, InstrumentType, LendingPosition,
    NewFutureContract, NewLendingPosition, NewOptionSeries, NewPerpContract, NewSpotInstrument,
    OptionSeries, OptionType, PerpContract, SpotInstrument,
};
pub use market::{Market, MarketFilter, MarketPatch, NewMarket, ResolvedMarket};
pub use page::{Page, PageRequest};
pub use quality::{FlagFilter, FlagType, NewQualityFlag, QualityFlag, Severity};
pub use relationship::{NewRelationship, Relationship, RelationshipFilter, RelationshipType};
pub use venue::{NewVenue, NewVenueAsset, Venue, VenueAsset, VenueAssetFilter, VenueType};

use thiserror::Error;

/// Returned when a string does not belong to one of the closed enum sets.
#[derive(Debug, Clone, Error)]
#[error("invalid {kind}: {value:?}")]
pub struct InvalidEnum {
    pub kind: &'static str,
    pub value: String,
}

impl InvalidEnum {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
