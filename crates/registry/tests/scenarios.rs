//! End-to-end scenarios against a live Postgres, with a recording event sink
//! and the cache disabled (Redis-backed variants at the bottom exercise the
//! hot-path cache when Redis is also up).
//!
//! ```bash
//! ATLAS_TEST_DB_HOST=localhost ATLAS_TEST_DB_NAME=atlas_test \
//!     cargo test -p atlas-registry -- --ignored
//! ```

use std::sync::Arc;

use rust_decimal_macros::dec;
use uuid::Uuid;

use atlas_model::{
    AssetFilter, AssetType, ChainFamily, EntityType, EventType, FlagType, NewAsset, NewChain,
    NewDeployment, NewIdentifier, NewMarket, NewQualityFlag, NewRelationship, NewSpotInstrument,
    NewVenue, PageRequest, RelationshipType, Severity, VenueType,
};
use atlas_registry::{
    CacheConfig, CacheManager, RecordingSink, Registry, RegistryError, RegistryOptions, TtlConfig,
};
use atlas_store::{Database, DbConfig};

fn test_db_config() -> DbConfig {
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

async fn setup() -> (Registry, Arc<RecordingSink>) {
    let db = Database::connect(&test_db_config())
        .await
        .expect("failed to connect to test database");
    db.migrate().await.expect("migrations failed");

    let sink = Arc::new(RecordingSink::new());
    let registry = Registry::new(
        &db,
        CacheManager::disabled(),
        TtlConfig::default(),
        sink.clone(),
        RegistryOptions::default(),
    );
    (registry, sink)
}

fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", &Uuid::new_v4().simple().to_string()[..8])
}

fn fungible(symbol: &str, name: &str) -> NewAsset {
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

async fn seed_chain(registry: &Registry, family: ChainFamily) -> String {
    let id = unique("chain");
    registry
        .create_chain(NewChain {
            id: id.clone(),
            name: id.clone(),
            family,
            native_asset_id: None,
            explorer_url: None,
            rpc_urls: vec![],
            is_testnet: false,
        })
        .await
        .expect("chain seeds");
    id
}

/// Scenario 1: the resolve hot path returns the preloaded market joined with
/// its instrument and specs.
#[tokio::test]
#[ignore = "requires Postgres"]
async fn resolve_hot_path() {
    let (registry, _sink) = setup().await;

    let eth = registry
        .create_asset(fungible("ETH", "Ether"))
        .await
        .unwrap()
        .asset;
    let usdt = registry
        .create_asset(fungible("USDT", "Tether USD"))
        .await
        .unwrap()
        .asset;
    let venue_id = unique("binance");
    registry
        .create_venue(NewVenue {
            id: venue_id.clone(),
            name: "Binance".to_string(),
            venue_type: VenueType::Cex,
            chain_id: None,
            protocol_address: None,
            api_url: None,
        })
        .await
        .unwrap();
    let (instrument, _spot) = registry
        .create_spot_instrument(NewSpotInstrument {
            code: unique("spot:eth_usdt"),
            base_asset_id: eth.id,
            quote_asset_id: usdt.id,
        })
        .await
        .unwrap();
    let market = registry
        .create_market(NewMarket {
            instrument_id: instrument.id,
            venue_id: venue_id.clone(),
            venue_symbol: "ETHUSDT".to_string(),
            settlement_asset_id: None,
            price_currency_id: Some(usdt.id),
            tick_size: Some(dec!(0.01)),
            lot_size: Some(dec!(0.0001)),
            min_order_size: None,
            max_order_size: None,
            min_notional: None,
            maker_fee: Some(dec!(0.001)),
            taker_fee: Some(dec!(0.001)),
            funding_interval_secs: None,
            listed_at: None,
        })
        .await
        .unwrap();

    let resolved = registry
        .resolve_market(&venue_id, "ETHUSDT")
        .await
        .expect("hot path resolves");
    assert_eq!(resolved.market.id, market.id);
    assert_eq!(resolved.instrument.id, instrument.id);
    assert_eq!(resolved.market.tick_size, Some(dec!(0.01)));
    assert_eq!(resolved.market.lot_size, Some(dec!(0.0001)));
    let detail = resolved.detail.clone().expect("spot detail present");
    assert_eq!(detail.instrument_type(), resolved.instrument.instrument_type);

    // Second call returns the same view.
    let again = registry.resolve_market(&venue_id, "ETHUSDT").await.unwrap();
    assert_eq!(again, resolved);

    let missing = registry.resolve_market(&venue_id, "NOPE").await.unwrap_err();
    assert!(matches!(missing, RegistryError::NotFound { .. }));
}

/// Scenario 2: the same logical USDC deploys on two chains; re-deploying at
/// an occupied (chain, address) fails AlreadyExists.
#[tokio::test]
#[ignore = "requires Postgres"]
async fn cross_chain_collision() {
    let (registry, _sink) = setup().await;

    let usdc = registry
        .create_asset(fungible("USDC", "USD Coin"))
        .await
        .unwrap()
        .asset;
    let ethereum = seed_chain(&registry, ChainFamily::Evm).await;
    let polygon = seed_chain(&registry, ChainFamily::Evm).await;

    let mainnet = NewDeployment {
        asset_id: usdc.id,
        chain_id: ethereum.clone(),
        address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
        decimals: 6,
        is_canonical: true,
        deployed_at_block: None,
        deployed_at: None,
        deployer_address: None,
    };
    registry.create_deployment(mainnet.clone()).await.unwrap();
    registry
        .create_deployment(NewDeployment {
            chain_id: polygon,
            address: "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174".to_string(),
            is_canonical: false,
            ..mainnet.clone()
        })
        .await
        .unwrap();

    let err = registry.create_deployment(mainnet).await.unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyExists { .. }), "{err}");

    // And the contract address resolves back to the canonical asset.
    let (_, asset) = registry
        .resolve_asset(&ethereum, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")
        .await
        .unwrap();
    assert_eq!(asset.id, usdc.id);
}

/// Scenario 3: wraps edges must stay acyclic; stakes edges live in their own
/// graph.
#[tokio::test]
#[ignore = "requires Postgres"]
async fn relationship_cycle_refused() {
    let (registry, _sink) = setup().await;

    let eth = registry
        .create_asset(fungible("ETH", "Ether"))
        .await
        .unwrap()
        .asset;
    let weth = registry
        .create_asset(fungible("WETH", "Wrapped Ether"))
        .await
        .unwrap()
        .asset;
    let steth = registry
        .create_asset(fungible("stETH", "Lido Staked Ether"))
        .await
        .unwrap()
        .asset;

    registry
        .create_relationship(NewRelationship {
            from_asset_id: weth.id,
            to_asset_id: eth.id,
            relationship_type: RelationshipType::Wraps,
            conversion_rate: Some(dec!(1)),
            protocol: None,
            description: None,
        })
        .await
        .expect("weth wraps eth");
    registry
        .create_relationship(NewRelationship {
            from_asset_id: steth.id,
            to_asset_id: eth.id,
            relationship_type: RelationshipType::Stakes,
            conversion_rate: None,
            protocol: Some("lido".to_string()),
            description: None,
        })
        .await
        .expect("steth stakes eth");

    let err = registry
        .create_relationship(NewRelationship {
            from_asset_id: eth.id,
            to_asset_id: weth.id,
            relationship_type: RelationshipType::Wraps,
            conversion_rate: None,
            protocol: None,
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::FailedPrecondition(_)), "{err}");

    let self_ref = registry
        .create_relationship(NewRelationship {
            from_asset_id: eth.id,
            to_asset_id: eth.id,
            relationship_type: RelationshipType::Wraps,
            conversion_rate: None,
            protocol: None,
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(self_ref, RegistryError::InvalidArgument { .. }));
}

/// Scenario 4: the quality gate flips tradability and publishes raise then
/// resolve, in that order.
#[tokio::test]
#[ignore = "requires Postgres"]
async fn quality_gate_round_trip() {
    let (registry, sink) = setup().await;

    let asset = registry
        .create_asset(fungible("SUS", "Suspicious Token"))
        .await
        .unwrap()
        .asset;
    assert!(registry.is_tradable(asset.id).await.unwrap());
    sink.drain();

    let flag = registry
        .raise_flag(NewQualityFlag {
            asset_id: asset.id,
            flag_type: FlagType::Scam,
            severity: Severity::Critical,
            source: "foo".to_string(),
            reason: "honeypot detected".to_string(),
        })
        .await
        .unwrap();
    assert!(!registry.is_tradable(asset.id).await.unwrap());

    let resolved = registry
        .resolve_flag(flag.id, "ops", Some("false positive"))
        .await
        .unwrap();
    assert!(resolved.resolved_at.is_some());
    assert!(registry.is_tradable(asset.id).await.unwrap());

    // Resolving twice is a precondition failure.
    let err = registry.resolve_flag(flag.id, "ops", None).await.unwrap_err();
    assert!(matches!(err, RegistryError::FailedPrecondition(_)));

    let events: Vec<EventType> = sink.drain().into_iter().map(|e| e.event_type).collect();
    assert_eq!(
        events,
        vec![EventType::QualityFlagRaised, EventType::QualityFlagResolved]
    );

    // Non-critical severities never gate.
    registry
        .raise_flag(NewQualityFlag {
            asset_id: asset.id,
            flag_type: FlagType::LowLiquidity,
            severity: Severity::High,
            source: "foo".to_string(),
            reason: "thin book".to_string(),
        })
        .await
        .unwrap();
    assert!(registry.is_tradable(asset.id).await.unwrap());
}

/// Scenario 5: identifier (source, external-id) is globally unique and
/// resolves back to the first entity that claimed it.
#[tokio::test]
#[ignore = "requires Postgres"]
async fn identifier_uniqueness() {
    let (registry, _sink) = setup().await;

    let a1 = registry
        .create_asset(fungible("USDC", "USD Coin"))
        .await
        .unwrap()
        .asset;
    let a2 = registry
        .create_asset(fungible("USDC.e", "Bridged USDC"))
        .await
        .unwrap()
        .asset;

    let external_id = unique("usd-coin");
    registry
        .create_identifier(NewIdentifier {
            entity_type: EntityType::Asset,
            asset_id: Some(a1.id),
            instrument_id: None,
            market_id: None,
            source: "coingecko".to_string(),
            external_id: external_id.clone(),
            is_primary: true,
            metadata: None,
        })
        .await
        .unwrap();

    let err = registry
        .create_identifier(NewIdentifier {
            entity_type: EntityType::Asset,
            asset_id: Some(a2.id),
            instrument_id: None,
            market_id: None,
            source: "coingecko".to_string(),
            external_id: external_id.clone(),
            is_primary: false,
            metadata: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyExists { .. }), "{err}");

    let (_, entity) = registry
        .resolve_external_id("coingecko", &external_id)
        .await
        .unwrap();
    assert_eq!(entity.entity_type, EntityType::Asset);
    assert_eq!(entity.entity_id, a1.id);

    // Unknown sources are rejected up front.
    let err = registry
        .create_identifier(NewIdentifier {
            entity_type: EntityType::Asset,
            asset_id: Some(a2.id),
            instrument_id: None,
            market_id: None,
            source: "somebodys-blog".to_string(),
            external_id: unique("x"),
            is_primary: false,
            metadata: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("source"));
}

/// Scenario 6: searching 25 matching assets in pages of 10 yields 10/10/5
/// with no duplicates.
#[tokio::test]
#[ignore = "requires Postgres"]
async fn search_pagination() {
    let (registry, _sink) = setup().await;

    let marker = unique("stableprobe");
    for i in 0..25 {
        registry
            .create_asset(NewAsset {
                symbol: format!("ST{i:02}"),
                name: format!("{marker} coin {i:02}"),
                asset_type: AssetType::FungibleToken,
                category: Some("stablecoin".to_string()),
                description: None,
                media_url: None,
                homepage_url: None,
            })
            .await
            .unwrap();
    }

    let mut seen = std::collections::HashSet::new();
    let mut sizes = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = registry
            .search_assets(
                &marker,
                AssetFilter::default(),
                PageRequest::new(Some(10), token.as_deref()).unwrap(),
            )
            .await
            .unwrap();
        sizes.push(page.items.len());
        for asset in &page.items {
            assert!(seen.insert(asset.id), "duplicate asset across pages");
        }
        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    assert_eq!(seen.len(), 25);
    // The marker makes matches exact: 25 rows in pages of 10 is 10/10/5.
    assert_eq!(sizes, vec![10, 10, 5]);

    // Paging bounds are enforced, and a garbage token maps onto
    // InvalidArgument at the service taxonomy.
    assert!(PageRequest::new(Some(0), None).is_err());
    assert!(PageRequest::new(Some(201), None).is_err());
    assert!(PageRequest::new(Some(200), None).is_ok());
    let err: RegistryError = PageRequest::new(Some(10), Some("not a token"))
        .unwrap_err()
        .into();
    assert_eq!(err.field(), Some("page_token"));
}

/// Hot-path caching: with Redis up, the first resolve backfills the
/// venue-symbol key and a second resolve is served without touching the
/// database row again.
#[tokio::test]
#[ignore = "requires Postgres and Redis"]
async fn resolve_populates_cache() {
    let db = Database::connect(&test_db_config()).await.unwrap();
    db.migrate().await.unwrap();

    let cache = CacheManager::connect(&CacheConfig {
        host: std::env::var("ATLAS_TEST_REDIS_HOST").unwrap_or_else(|_| "localhost".to_string()),
        port: 6379,
        password: None,
        db: 0,
        default_ttl: 60,
        pool_size: 4,
    })
    .await
    .expect("redis reachable");

    let registry = Registry::new(
        &db,
        cache.clone(),
        TtlConfig::default(),
        Arc::new(RecordingSink::new()),
        RegistryOptions::default(),
    );

    let eth = registry
        .create_asset(fungible("ETH", "Ether"))
        .await
        .unwrap()
        .asset;
    let usdt = registry
        .create_asset(fungible("USDT", "Tether USD"))
        .await
        .unwrap()
        .asset;
    let venue_id = unique("venue");
    registry
        .create_venue(NewVenue {
            id: venue_id.clone(),
            name: "Cache Venue".to_string(),
            venue_type: VenueType::Cex,
            chain_id: None,
            protocol_address: None,
            api_url: None,
        })
        .await
        .unwrap();
    let (instrument, _) = registry
        .create_spot_instrument(NewSpotInstrument {
            code: unique("spot:cache"),
            base_asset_id: eth.id,
            quote_asset_id: usdt.id,
        })
        .await
        .unwrap();
    registry
        .create_market(NewMarket {
            instrument_id: instrument.id,
            venue_id: venue_id.clone(),
            venue_symbol: "CACHEPAIR".to_string(),
            settlement_asset_id: None,
            price_currency_id: None,
            tick_size: Some(dec!(0.01)),
            lot_size: Some(dec!(0.01)),
            min_order_size: None,
            max_order_size: None,
            min_notional: None,
            maker_fee: None,
            taker_fee: None,
            funding_interval_secs: None,
            listed_at: None,
        })
        .await
        .unwrap();

    let first = registry.resolve_market(&venue_id, "CACHEPAIR").await.unwrap();

    // The backfilled key now answers directly.
    let key = format!("market:{venue_id}:CACHEPAIR");
    let cached: Option<atlas_model::Market> = cache.get_json("market", &key).await;
    assert_eq!(cached.as_ref().map(|m| m.id), Some(first.market.id));

    let second = registry.resolve_market(&venue_id, "CACHEPAIR").await.unwrap();
    assert_eq!(second, first);
}
