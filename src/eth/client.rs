use std::sync::Arc;

use ethers::prelude::*;

use super::ChainError;
use crate::config::Config;

/// Shared JSON-RPC provider plus the council signing wallets. One instance
/// lives in the application state; contract bindings are built per call
/// against the target aggregator address.
pub struct ChainClient {
    provider: Arc<Provider<Http>>,
    chain_id: u64,
    signers: Vec<LocalWallet>,
}

impl ChainClient {
    /// Build from config. Returns `None` when no RPC endpoint is configured;
    /// malformed council keys are skipped with a warning so one bad slot
    /// does not take the others down.
    pub fn from_config(config: &Config) -> Option<Self> {
        let rpc_url = config.rpc_url.as_deref()?;

        let provider = match Provider::<Http>::try_from(rpc_url) {
            Ok(provider) => Arc::new(provider),
            Err(e) => {
                tracing::error!("invalid RPC_URL: {e}");
                return None;
            }
        };

        let signers: Vec<LocalWallet> = config
            .council_keys
            .iter()
            .enumerate()
            .filter_map(|(slot, key)| match key.parse::<LocalWallet>() {
                Ok(wallet) => Some(wallet.with_chain_id(config.chain_id)),
                Err(e) => {
                    tracing::warn!("skipping malformed council key in slot {slot}: {e}");
                    None
                }
            })
            .collect();

        tracing::info!(
            chain_id = config.chain_id,
            councils = signers.len(),
            "chain client initialized"
        );

        Some(Self {
            provider,
            chain_id: config.chain_id,
            signers,
        })
    }

    pub fn provider(&self) -> Arc<Provider<Http>> {
        Arc::clone(&self.provider)
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn council_count(&self) -> usize {
        self.signers.len()
    }

    pub(super) fn council_wallet(&self, slot: usize) -> Result<LocalWallet, ChainError> {
        self.signers
            .get(slot)
            .cloned()
            .ok_or(ChainError::NoCouncilKey(slot))
    }
}
