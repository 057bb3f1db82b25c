//! Cache-aside manager over Redis.
//!
//! Single-entity reads go through here; every failure degrades to a miss or
//! a no-op so the durable store remains the source of truth. Hit, miss,
//! set-error, and skip counts are exported per entity.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Connection settings. Field names match the `cache.*` section of the
/// service configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub db: i64,
    /// Fallback TTL in seconds for keys without a per-entity override.
    #[serde(default = "default_ttl")]
    pub default_ttl: u64,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

fn default_port() -> u16 {
    6379
}

fn default_ttl() -> u64 {
    3600
}

fn default_pool_size() -> u32 {
    8
}

/// Per-entity TTL overrides, seconds. Defaults reflect how volatile each
/// entity actually is: reference data an hour, venue listings fifteen
/// minutes, the tradability counter five.
#[derive(Debug, Clone, Deserialize)]
pub struct TtlConfig {
    #[serde(default = "ttl_stable")]
    pub asset: u64,
    #[serde(default = "ttl_stable")]
    pub chain: u64,
    #[serde(default = "ttl_stable")]
    pub venue: u64,
    #[serde(default = "ttl_stable")]
    pub instrument: u64,
    #[serde(default = "ttl_stable")]
    pub identifier: u64,
    #[serde(default = "ttl_operational")]
    pub market: u64,
    #[serde(default = "ttl_operational")]
    pub venue_asset: u64,
    #[serde(default = "ttl_volatile")]
    pub quality_flag: u64,
}

fn ttl_stable() -> u64 {
    3600
}

fn ttl_operational() -> u64 {
    900
}

fn ttl_volatile() -> u64 {
    300
}

impl Default for TtlConfig {
    fn default() -> Self {
        // serde defaults and Default must agree.
        serde_json::from_value(serde_json::json!({})).expect("empty TtlConfig deserializes")
    }
}

/// Cache key builders. One place so key shapes never drift between readers
/// and invalidators.
pub mod keys {
    use atlas_model::InstrumentType;
    use uuid::Uuid;

    pub fn asset(id: Uuid) -> String {
        format!("asset:{id}")
    }

    pub fn chain(id: &str) -> String {
        format!("chain:{id}")
    }

    pub fn venue(id: &str) -> String {
        format!("venue:{id}")
    }

    pub fn instrument(id: Uuid) -> String {
        format!("instrument:{id}")
    }

    pub fn instrument_detail(instrument_type: InstrumentType, id: Uuid) -> String {
        match instrument_type {
            InstrumentType::Spot => format!("spot_instrument:{id}"),
            InstrumentType::Perpetual => format!("perp_contract:{id}"),
            InstrumentType::Future => format!("future_contract:{id}"),
            InstrumentType::Option => format!("option_series:{id}"),
            InstrumentType::LendingDeposit => format!("lending_deposit:{id}"),
            InstrumentType::LendingBorrow => format!("lending_borrow:{id}"),
        }
    }

    pub fn market(id: Uuid) -> String {
        format!("market:{id}")
    }

    /// The hot-path key: venue plus venue-local symbol.
    pub fn market_by_symbol(venue_id: &str, venue_symbol: &str) -> String {
        format!("market:{venue_id}:{venue_symbol}")
    }

    pub fn venue_asset(venue_id: &str, asset_id: Uuid) -> String {
        format!("venue_asset:{venue_id}:{asset_id}")
    }

    pub fn identifier(source: &str, external_id: &str) -> String {
        format!("identifier:{source}:{external_id}")
    }

    pub fn critical_flags(asset_id: Uuid) -> String {
        format!("quality_flags:{asset_id}:critical_active")
    }
}

/// Process-wide cache client. Cloneable; all operations are best-effort.
#[derive(Clone)]
pub struct CacheManager {
    conn: Option<ConnectionManager>,
}

impl CacheManager {
    pub async fn connect(config: &CacheConfig) -> Result<Self, redis::RedisError> {
        let info = redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: redis::RedisConnectionInfo {
                db: config.db,
                username: None,
                password: config.password.clone(),
            },
        };
        let client = redis::Client::open(info)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn: Some(conn) })
    }

    /// A manager with no backing connection: every read misses, every write
    /// is a no-op. Used in tests and when the cache is down at startup —
    /// cache unavailability never fails a request.
    pub fn disabled() -> Self {
        Self { conn: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    pub async fn ping(&self) -> bool {
        let Some(conn) = &self.conn else { return false };
        let mut conn = conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .is_ok()
    }

    /// Cache probe. Decodes the stored JSON; any failure (including a decode
    /// of a stale shape) is treated as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, entity: &'static str, key: &str) -> Option<T> {
        let Some(conn) = &self.conn else {
            metrics::counter!("atlas_cache_misses_total", "entity" => entity).increment(1);
            return None;
        };
        let mut conn = conn.clone();
        let raw: Option<String> = match conn.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(key, "cache read failed: {e}");
                None
            }
        };
        match raw.and_then(|s| serde_json::from_str(&s).ok()) {
            Some(value) => {
                metrics::counter!("atlas_cache_hits_total", "entity" => entity).increment(1);
                Some(value)
            }
            None => {
                metrics::counter!("atlas_cache_misses_total", "entity" => entity).increment(1);
                None
            }
        }
    }

    /// Best-effort write-back. Failures are counted and logged, never
    /// surfaced.
    pub async fn set_json<T: Serialize>(
        &self,
        entity: &'static str,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) {
        let Some(conn) = &self.conn else { return };
        let payload = match serde_json::to_string(value) {
            Ok(p) => p,
            Err(e) => {
                warn!(key, "cache serialization failed: {e}");
                metrics::counter!("atlas_cache_set_errors_total", "entity" => entity).increment(1);
                return;
            }
        };
        let mut conn = conn.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(key, payload, ttl_secs)
            .await
        {
            warn!(key, "cache write failed: {e}");
            metrics::counter!("atlas_cache_set_errors_total", "entity" => entity).increment(1);
        }
    }

    /// Synchronous post-commit invalidation. A failed delete is logged and
    /// counted; the next TTL expiry restores consistency.
    pub async fn delete(&self, entity: &'static str, cache_keys: &[String]) {
        let Some(conn) = &self.conn else { return };
        if cache_keys.is_empty() {
            return;
        }
        let mut conn = conn.clone();
        if let Err(e) = conn.del::<_, ()>(cache_keys).await {
            warn!(?cache_keys, "cache invalidation failed: {e}");
            metrics::counter!("atlas_cache_set_errors_total", "entity" => entity).increment(1);
        }
    }

    /// Counts a deliberate cache bypass (list/search endpoints).
    pub fn record_skip(&self, entity: &'static str) {
        metrics::counter!("atlas_cache_skips_total", "entity" => entity).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_model::InstrumentType;
    use uuid::Uuid;

    #[test]
    fn key_shapes_are_stable() {
        let id = Uuid::nil();
        assert_eq!(
            keys::asset(id),
            "asset:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(keys::market_by_symbol("binance", "ETHUSDT"), "market:binance:ETHUSDT");
        assert_eq!(keys::identifier("coingecko", "usd-coin"), "identifier:coingecko:usd-coin");
        assert_eq!(
            keys::critical_flags(id),
            "quality_flags:00000000-0000-0000-0000-000000000000:critical_active"
        );
        assert_eq!(
            keys::instrument_detail(InstrumentType::Spot, id),
            format!("spot_instrument:{id}")
        );
    }

    #[test]
    fn ttl_defaults_follow_volatility() {
        let ttl = TtlConfig::default();
        assert_eq!(ttl.asset, 3600);
        assert_eq!(ttl.instrument, 3600);
        assert_eq!(ttl.market, 900);
        assert_eq!(ttl.venue_asset, 900);
        assert_eq!(ttl.quality_flag, 300);
    }

    #[tokio::test]
    async fn disabled_cache_misses_and_noops() {
        let cache = CacheManager::disabled();
        assert!(!cache.is_enabled());
        assert!(!cache.ping().await);
        assert_eq!(cache.get_json::<i64>("asset", "asset:x").await, None);
        cache.set_json("asset", "asset:x", &1i64, 60).await;
        cache.delete("asset", &["asset:x".to_string()]).await;
        assert_eq!(cache.get_json::<i64>("asset", "asset:x").await, None);
    }
}
