//! Integration tests against a live Postgres.
//!
//! Run with a scratch database:
//!
//! ```bash
//! ATLAS_TEST_DB_HOST=localhost ATLAS_TEST_DB_NAME=atlas_test \
//!     cargo test -p atlas-store -- --ignored
//! ```

use rust_decimal_macros::dec;
use uuid::Uuid;

use atlas_model::{
    AssetType, ChainFamily, EntityType, FlagFilter, NewAsset, NewChain, NewDeployment,
    NewIdentifier, NewSpotInstrument, NewVenue, NewMarket, VenueType,
};
use atlas_store::{Database, DbConfig, Stores, StoreError};

fn test_config() -> DbConfig {
    DbConfig {
        host: std::env::var("ATLAS_TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: 5432,
        user: std::env::var("ATLAS_TEST_DB_USER").unwrap_or_else(|_| "atlas".to_string()),
        password: std::env::var("ATLAS_TEST_DB_PASSWORD").unwrap_or_else(|_| "atlas".to_string()),
        database: std::env::var("ATLAS_TEST_DB_NAME").unwrap_or_else(|_| "atlas_test".to_string()),
        ssl_mode: "disable".to_string(),
        max_conns: 5,
        min_conns: 1,
        max_conn_lifetime: 1800,
        connect_timeout: 10,
        query_timeout: 5,
    }
}

async fn setup() -> (Database, Stores) {
    let db = Database::connect(&test_config())
        .await
        .expect("failed to connect to test database");
    db.migrate().await.expect("migrations failed");
    let stores = Stores::new(&db);
    (db, stores)
}

fn new_asset(symbol: &str, name: &str) -> NewAsset {
    NewAsset {
        symbol: symbol.to_string(),
        name: name.to_string(),
        asset_type: AssetType::FungibleToken,
        category: None,
        description: None,
        media_url: None,
        homepage_url: None,
    }
}

fn new_chain(id: &str, family: ChainFamily) -> NewChain {
    NewChain {
        id: id.to_string(),
        name: id.to_string(),
        family,
        native_asset_id: None,
        explorer_url: None,
        rpc_urls: vec![],
        is_testnet: false,
    }
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn health_check_and_migrations() {
    let (db, _) = setup().await;
    db.health_check().await.expect("health check failed");
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn asset_round_trips_and_soft_delete() {
    let (_db, stores) = setup().await;

    let id = Uuid::new_v4();
    let created = stores
        .assets
        .insert(id, &new_asset("RT", "Round Trip"))
        .await
        .unwrap();
    assert_eq!(created.symbol, "RT");
    assert!(created.deleted_at.is_none());

    let fetched = stores.assets.get(id).await.unwrap().expect("asset exists");
    assert_eq!(fetched, created);

    stores.assets.soft_delete(id).await.unwrap().expect("deleted");
    assert!(stores.assets.get(id).await.unwrap().is_none());

    // Soft delete is idempotent on the absent path.
    assert!(stores.assets.soft_delete(id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn duplicate_deployment_classifies_already_exists() {
    let (_db, stores) = setup().await;

    let asset = stores
        .assets
        .insert(Uuid::new_v4(), &new_asset("DUP", "Duplicate Probe"))
        .await
        .unwrap();
    let chain_id = format!("testchain_{}", &Uuid::new_v4().simple().to_string()[..8]);
    stores
        .chains
        .insert(&new_chain(&chain_id, ChainFamily::Evm))
        .await
        .unwrap();

    let deployment = NewDeployment {
        asset_id: asset.id,
        chain_id: chain_id.clone(),
        address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
        decimals: 6,
        is_canonical: true,
        deployed_at_block: None,
        deployed_at: None,
        deployer_address: None,
    };
    stores
        .deployments
        .insert(Uuid::new_v4(), &deployment)
        .await
        .unwrap();

    let err = stores
        .deployments
        .insert(Uuid::new_v4(), &deployment)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }), "{err}");
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn deployment_decimals_check_enforced() {
    let (_db, stores) = setup().await;

    let asset = stores
        .assets
        .insert(Uuid::new_v4(), &new_asset("D19", "Too Precise"))
        .await
        .unwrap();
    let chain_id = format!("testchain_{}", &Uuid::new_v4().simple().to_string()[..8]);
    stores
        .chains
        .insert(&new_chain(&chain_id, ChainFamily::Evm))
        .await
        .unwrap();

    let err = stores
        .deployments
        .insert(
            Uuid::new_v4(),
            &NewDeployment {
                asset_id: asset.id,
                chain_id,
                address: "0x0000000000000000000000000000000000000019".to_string(),
                decimals: 19,
                is_canonical: false,
                deployed_at_block: None,
                deployed_at: None,
                deployer_address: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::CheckViolation { .. }), "{err}");
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn deployment_with_missing_parent_classifies_foreign_key() {
    let (_db, stores) = setup().await;

    let err = stores
        .deployments
        .insert(
            Uuid::new_v4(),
            &NewDeployment {
                asset_id: Uuid::new_v4(),
                chain_id: "no_such_chain".to_string(),
                address: "0x00000000000000000000000000000000000000fk".to_string(),
                decimals: 18,
                is_canonical: false,
                deployed_at_block: None,
                deployed_at: None,
                deployer_address: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ForeignKey { .. }), "{err}");
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn instrument_and_subtype_are_transactional() {
    let (_db, stores) = setup().await;

    let base = stores
        .assets
        .insert(Uuid::new_v4(), &new_asset("ETH", "Ether"))
        .await
        .unwrap();
    let quote = stores
        .assets
        .insert(Uuid::new_v4(), &new_asset("USDT", "Tether USD"))
        .await
        .unwrap();

    let code = format!("spot:eth_usdt_{}", &Uuid::new_v4().simple().to_string()[..8]);
    let id = Uuid::new_v4();
    let (instrument, spot) = stores
        .instruments
        .insert_spot(
            id,
            &NewSpotInstrument {
                code: code.clone(),
                base_asset_id: base.id,
                quote_asset_id: quote.id,
            },
        )
        .await
        .unwrap();
    assert_eq!(instrument.code, code);
    assert_eq!(spot.base_asset_id, base.id);

    // A spot referencing a missing asset rolls the whole pair back.
    let bad_code = format!("spot:bad_{}", &Uuid::new_v4().simple().to_string()[..8]);
    let err = stores
        .instruments
        .insert_spot(
            Uuid::new_v4(),
            &NewSpotInstrument {
                code: bad_code.clone(),
                base_asset_id: Uuid::new_v4(),
                quote_asset_id: quote.id,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::ForeignKey { .. }), "{err}");
    assert!(stores
        .instruments
        .get_by_code(&bad_code)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn market_venue_symbol_unique_and_resolvable() {
    let (_db, stores) = setup().await;

    let base = stores
        .assets
        .insert(Uuid::new_v4(), &new_asset("ETH", "Ether"))
        .await
        .unwrap();
    let quote = stores
        .assets
        .insert(Uuid::new_v4(), &new_asset("USDT", "Tether USD"))
        .await
        .unwrap();
    let venue_id = format!("venue_{}", &Uuid::new_v4().simple().to_string()[..8]);
    stores
        .venues
        .insert(&NewVenue {
            id: venue_id.clone(),
            name: "Test Venue".to_string(),
            venue_type: VenueType::Cex,
            chain_id: None,
            protocol_address: None,
            api_url: None,
        })
        .await
        .unwrap();
    let (instrument, _) = stores
        .instruments
        .insert_spot(
            Uuid::new_v4(),
            &NewSpotInstrument {
                code: format!("spot:ethusdt_{}", &Uuid::new_v4().simple().to_string()[..8]),
                base_asset_id: base.id,
                quote_asset_id: quote.id,
            },
        )
        .await
        .unwrap();

    let market = NewMarket {
        instrument_id: instrument.id,
        venue_id: venue_id.clone(),
        venue_symbol: "ETHUSDT".to_string(),
        settlement_asset_id: None,
        price_currency_id: None,
        tick_size: Some(dec!(0.01)),
        lot_size: Some(dec!(0.0001)),
        min_order_size: None,
        max_order_size: None,
        min_notional: None,
        maker_fee: Some(dec!(0.001)),
        taker_fee: Some(dec!(0.001)),
        funding_interval_secs: None,
        listed_at: None,
    };
    let created = stores.markets.insert(Uuid::new_v4(), &market).await.unwrap();

    let resolved = stores
        .markets
        .get_by_venue_symbol(&venue_id, "ETHUSDT")
        .await
        .unwrap()
        .expect("market resolves");
    assert_eq!(resolved.id, created.id);
    assert_eq!(resolved.tick_size, Some(dec!(0.01)));

    let err = stores
        .markets
        .insert(Uuid::new_v4(), &market)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }), "{err}");
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn identifier_global_uniqueness() {
    let (_db, stores) = setup().await;

    let a1 = stores
        .assets
        .insert(Uuid::new_v4(), &new_asset("USDC", "USD Coin"))
        .await
        .unwrap();
    let a2 = stores
        .assets
        .insert(Uuid::new_v4(), &new_asset("USDC", "USD Coin (bridged)"))
        .await
        .unwrap();

    let external = format!("usd-coin-{}", &Uuid::new_v4().simple().to_string()[..8]);
    let first = NewIdentifier {
        entity_type: EntityType::Asset,
        asset_id: Some(a1.id),
        instrument_id: None,
        market_id: None,
        source: "coingecko".to_string(),
        external_id: external.clone(),
        is_primary: true,
        metadata: None,
    };
    stores
        .identifiers
        .insert(Uuid::new_v4(), &first)
        .await
        .unwrap();

    let mut second = first.clone();
    second.asset_id = Some(a2.id);
    let err = stores
        .identifiers
        .insert(Uuid::new_v4(), &second)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }), "{err}");

    let resolved = stores
        .identifiers
        .get_by_external("coingecko", &external)
        .await
        .unwrap()
        .expect("identifier resolves");
    assert_eq!(resolved.asset_id, Some(a1.id));
    assert_eq!(resolved.entity().unwrap().entity_id, a1.id);
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn quality_flag_lifecycle_is_one_way() {
    let (_db, stores) = setup().await;

    let asset = stores
        .assets
        .insert(Uuid::new_v4(), &new_asset("FLAG", "Flagged"))
        .await
        .unwrap();

    let flag = stores
        .quality
        .insert(
            Uuid::new_v4(),
            &atlas_model::NewQualityFlag {
                asset_id: asset.id,
                flag_type: atlas_model::FlagType::Scam,
                severity: atlas_model::Severity::Critical,
                source: "test".to_string(),
                reason: "honeypot detected".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(stores.quality.count_active_critical(asset.id).await.unwrap(), 1);

    let resolved = stores
        .quality
        .resolve(flag.id, "ops", Some("false positive"))
        .await
        .unwrap()
        .expect("resolves once");
    assert!(resolved.resolved_at.is_some());
    assert_eq!(stores.quality.count_active_critical(asset.id).await.unwrap(), 0);

    // Second resolve matches no active row.
    assert!(stores
        .quality
        .resolve(flag.id, "ops", None)
        .await
        .unwrap()
        .is_none());

    let active = stores
        .quality
        .list(
            &FlagFilter {
                asset_id: Some(asset.id),
                active_only: true,
                ..Default::default()
            },
            50,
            0,
        )
        .await
        .unwrap();
    assert!(active.is_empty());
}
