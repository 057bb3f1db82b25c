//! The registry facade: one handle owning the stores, the cache, and the
//! event sink. Domain operations are implemented in per-domain modules as
//! further `impl Registry` blocks.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use atlas_model::{EventEnvelope, EventType};
use atlas_store::{Database, Stores};

use crate::cache::{CacheManager, TtlConfig};
use crate::error::Result;
use crate::events::EventSink;

/// Knobs that are policy rather than wiring.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Producer name stamped on every event envelope.
    pub producer: String,
    /// Accepted identifier sources. A free string set, validated on create.
    pub identifier_sources: Vec<String>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            producer: "atlas-registry".to_string(),
            identifier_sources: vec![
                "coingecko".to_string(),
                "coinmarketcap".to_string(),
                "binance".to_string(),
                "bloomberg".to_string(),
                "internal".to_string(),
            ],
        }
    }
}

/// The resolution, integrity, and caching engine.
#[derive(Clone)]
pub struct Registry {
    pub(crate) stores: Stores,
    pub(crate) cache: CacheManager,
    pub(crate) ttl: TtlConfig,
    pub(crate) events: Arc<dyn EventSink>,
    pub(crate) options: Arc<RegistryOptions>,
}

impl Registry {
    pub fn new(
        db: &Database,
        cache: CacheManager,
        ttl: TtlConfig,
        events: Arc<dyn EventSink>,
        options: RegistryOptions,
    ) -> Self {
        Self {
            stores: Stores::new(db),
            cache,
            ttl,
            events,
            options: Arc::new(options),
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Post-commit event hand-off. Must be called only after the durable
    /// write has committed.
    pub(crate) fn publish<P: Serialize>(&self, event_type: EventType, payload: &P) {
        self.events
            .enqueue(EventEnvelope::new(event_type, &self.options.producer, payload));
    }

    /// Cache-aside read: probe, load on miss, best-effort backfill. The
    /// loader runs against the durable store and is only consulted on miss.
    pub(crate) async fn cached_fetch<T, F, Fut>(
        &self,
        entity: &'static str,
        key: String,
        ttl_secs: u64,
        load: F,
    ) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        if let Some(hit) = self.cache.get_json::<T>(entity, &key).await {
            return Ok(Some(hit));
        }
        let loaded = load().await?;
        if let Some(value) = &loaded {
            self.cache.set_json(entity, &key, value, ttl_secs).await;
        }
        Ok(loaded)
    }

    /// Post-commit invalidation, logged if it fails, never escalated.
    pub(crate) async fn invalidate(&self, entity: &'static str, cache_keys: Vec<String>) {
        if cache_keys.is_empty() {
            return;
        }
        self.cache.delete(entity, &cache_keys).await;
    }

    /// Informational lookups that must not fail the surrounding write.
    pub(crate) fn best_effort<T>(result: Result<Vec<T>>, what: &str) -> Vec<T> {
        match result {
            Ok(items) => items,
            Err(e) => {
                warn!("{what} lookup failed: {e}");
                Vec::new()
            }
        }
    }
}
