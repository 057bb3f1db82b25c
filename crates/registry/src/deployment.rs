//! Deployment operations: address syntax per chain family, decimals bounds,
//! and the contract-address resolution path.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use atlas_model::{
    deployment::MAX_DECIMALS, Asset, ChainFamily, Deployment, EventType, NewDeployment, Page,
    PageRequest,
};

use crate::error::{RegistryError, Result};
use crate::registry::Registry;

static EVM_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new("^0x[0-9a-fA-F]{40}$").expect("evm address regex"));

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Contract address syntax per chain family. UTXO chains have no contract
/// deployments at all.
pub(crate) fn validate_address(family: ChainFamily, address: &str) -> Result<()> {
    match family {
        ChainFamily::Evm => {
            if EVM_ADDRESS.is_match(address) {
                Ok(())
            } else {
                Err(RegistryError::invalid(
                    "address",
                    "expected 0x followed by 40 hex characters",
                ))
            }
        }
        ChainFamily::Svm => {
            let len_ok = (32..=44).contains(&address.len());
            let charset_ok = address.chars().all(|c| BASE58_ALPHABET.contains(c));
            if len_ok && charset_ok {
                Ok(())
            } else {
                Err(RegistryError::invalid(
                    "address",
                    "expected base58 of length 32-44",
                ))
            }
        }
        ChainFamily::Utxo => Err(RegistryError::invalid(
            "address",
            "utxo chains do not carry contract deployments",
        )),
        ChainFamily::NonEvm => {
            if address.trim().is_empty() {
                Err(RegistryError::invalid("address", "must not be empty"))
            } else {
                Ok(())
            }
        }
    }
}

impl Registry {
    pub async fn create_deployment(&self, input: NewDeployment) -> Result<Deployment> {
        if !(0..=MAX_DECIMALS).contains(&input.decimals) {
            return Err(RegistryError::invalid(
                "decimals",
                format!("must be between 0 and {MAX_DECIMALS}"),
            ));
        }

        // Both parents must exist; the chain also decides the address rules.
        self.get_asset(input.asset_id).await?;
        let chain = self.get_chain(&input.chain_id).await?;
        validate_address(chain.family, &input.address)?;

        let deployment = self
            .stores
            .deployments
            .insert(Uuid::new_v4(), &input)
            .await
            .map_err(|e| match e {
                atlas_store::StoreError::AlreadyExists { .. } => RegistryError::already_exists(
                    format!("deployment on {} at {}", input.chain_id, input.address),
                ),
                other => other.into(),
            })?;

        self.publish(EventType::DeploymentCreated, &deployment);
        Ok(deployment)
    }

    pub async fn get_deployment(&self, id: Uuid) -> Result<Deployment> {
        self.stores
            .deployments
            .get(id)
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("deployment {id}")))
    }

    /// Contract-address resolution: (chain, address) to the deployment and
    /// its canonical asset.
    pub async fn resolve_asset(&self, chain_id: &str, address: &str) -> Result<(Deployment, Asset)> {
        let deployment = self
            .stores
            .deployments
            .get_by_chain_address(chain_id, address)
            .await?
            .ok_or_else(|| {
                RegistryError::not_found(format!("deployment on {chain_id} at {address}"))
            })?;
        let asset = self.get_asset(deployment.asset_id).await?;
        Ok((deployment, asset))
    }

    pub async fn list_deployments_by_asset(&self, asset_id: Uuid) -> Result<Vec<Deployment>> {
        Ok(self.stores.deployments.list_by_asset(asset_id).await?)
    }

    pub async fn list_deployments_by_chain(
        &self,
        chain_id: &str,
        page: PageRequest,
    ) -> Result<Page<Deployment>> {
        let items = self
            .stores
            .deployments
            .list_by_chain(chain_id, page.size(), page.offset())
            .await?;
        Ok(Page::from_request(items, &page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evm_addresses() {
        assert!(validate_address(
            ChainFamily::Evm,
            "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
        )
        .is_ok());
        // Too short, missing prefix, non-hex.
        assert!(validate_address(ChainFamily::Evm, "0xA0b86991").is_err());
        assert!(validate_address(
            ChainFamily::Evm,
            "A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
        )
        .is_err());
        assert!(validate_address(
            ChainFamily::Evm,
            "0xZZb86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
        )
        .is_err());
    }

    #[test]
    fn svm_addresses() {
        assert!(validate_address(
            ChainFamily::Svm,
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
        )
        .is_ok());
        // Base58 excludes 0, O, I, l.
        assert!(validate_address(
            ChainFamily::Svm,
            "0PjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
        )
        .is_err());
        assert!(validate_address(ChainFamily::Svm, "tooshort").is_err());
    }

    #[test]
    fn utxo_rejects_contracts() {
        let err = validate_address(ChainFamily::Utxo, "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh")
            .unwrap_err();
        assert_eq!(err.field(), Some("address"));
    }

    #[test]
    fn non_evm_requires_non_empty() {
        assert!(validate_address(ChainFamily::NonEvm, "cosmos1abcdef").is_ok());
        assert!(validate_address(ChainFamily::NonEvm, "  ").is_err());
    }
}
