//! Durable storage for AssetAtlas.
//!
//! Row-oriented persistence over Postgres: every entity of the reference
//! model, the constraints that keep the registry coherent, and transactional
//! multi-statement writes. Raw SQL with bound parameters and explicit row
//! mapping; no ORM.

pub mod assets;
pub mod chains;
pub mod db;
pub mod deployments;
pub mod error;
pub mod groups;
pub mod identifiers;
pub mod instruments;
pub mod markets;
pub mod quality;
pub mod relationships;
pub mod venue_assets;
pub mod venues;

mod row;

pub use assets::AssetStore;
pub use chains::ChainStore;
pub use db::{Database, DbConfig};
pub use deployments::DeploymentStore;
pub use error::{Result, StoreError};
pub use groups::GroupStore;
pub use identifiers::IdentifierStore;
pub use instruments::InstrumentStore;
pub use markets::MarketStore;
pub use quality::QualityFlagStore;
pub use relationships::RelationshipStore;
pub use venue_assets::VenueAssetStore;
pub use venues::VenueStore;

/// Every entity store, constructed over one shared pool.
#[derive(Clone)]
pub struct Stores {
    pub assets: AssetStore,
    pub chains: ChainStore,
    pub deployments: DeploymentStore,
    pub relationships: RelationshipStore,
    pub groups: GroupStore,
    pub quality: QualityFlagStore,
    pub instruments: InstrumentStore,
    pub markets: MarketStore,
    pub venues: VenueStore,
    pub venue_assets: VenueAssetStore,
    pub identifiers: IdentifierStore,
}

impl Stores {
    pub fn new(db: &Database) -> Self {
        let pool = db.pool().clone();
        Self {
            assets: AssetStore::new(pool.clone()),
            chains: ChainStore::new(pool.clone()),
            deployments: DeploymentStore::new(pool.clone()),
            relationships: RelationshipStore::new(pool.clone()),
            groups: GroupStore::new(pool.clone()),
            quality: QualityFlagStore::new(pool.clone()),
            instruments: InstrumentStore::new(pool.clone()),
            markets: MarketStore::new(pool.clone()),
            venues: VenueStore::new(pool.clone()),
            venue_assets: VenueAssetStore::new(pool.clone()),
            identifiers: IdentifierStore::new(pool),
        }
    }
}
