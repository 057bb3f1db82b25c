//! Chain operations.

use once_cell::sync::Lazy;
use regex::Regex;

use atlas_model::{Chain, ChainFilter, EventType, NewChain, Page, PageRequest};

use crate::asset::non_empty;
use crate::cache::keys;
use crate::error::{RegistryError, Result};
use crate::registry::Registry;

// Chain ids are part of composite keys and cache key strings; keep them to a
// conservative charset.
static CHAIN_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-z0-9][a-z0-9_]{0,63}$").expect("chain id regex"));

impl Registry {
    pub async fn create_chain(&self, input: NewChain) -> Result<Chain> {
        if !CHAIN_ID.is_match(&input.id) {
            return Err(RegistryError::invalid(
                "id",
                "must be lowercase alphanumeric/underscore, at most 64 chars",
            ));
        }
        let input = NewChain {
            name: non_empty("name", &input.name)?,
            ..input
        };
        if let Some(native) = input.native_asset_id {
            // Surface a missing native asset as NotFound before the FK does.
            self.get_asset(native).await?;
        }

        let chain = self.stores.chains.insert(&input).await?;
        self.publish(EventType::ChainRegistered, &chain);
        Ok(chain)
    }

    pub async fn get_chain(&self, id: &str) -> Result<Chain> {
        let key = keys::chain(id);
        self.cached_fetch("chain", key, self.ttl.chain, || async move {
            Ok(self.stores.chains.get(id).await?)
        })
        .await?
        .ok_or_else(|| RegistryError::not_found(format!("chain {id}")))
    }

    pub async fn list_chains(
        &self,
        filter: ChainFilter,
        page: PageRequest,
    ) -> Result<Page<Chain>> {
        self.cache.record_skip("chain");
        let items = self
            .stores
            .chains
            .list(&filter, page.size(), page.offset())
            .await?;
        Ok(Page::from_request(items, &page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_charset() {
        assert!(CHAIN_ID.is_match("ethereum"));
        assert!(CHAIN_ID.is_match("polygon_pos"));
        assert!(CHAIN_ID.is_match("arbitrum1"));
        assert!(!CHAIN_ID.is_match("Ethereum"));
        assert!(!CHAIN_ID.is_match("polygon-pos"));
        assert!(!CHAIN_ID.is_match(""));
        assert!(!CHAIN_ID.is_match("_leading"));
    }
}
