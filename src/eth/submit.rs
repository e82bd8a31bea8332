use std::sync::Arc;

use ethers::prelude::*;
use ethers::types::{Address, I256, U256};

use super::{ChainClient, ChainError, RionAggregator};

impl ChainClient {
    /// Sign `submitValue(int256,uint256)` with the council wallet in `slot`
    /// and send it to the feed's aggregator. Returns the transaction hash
    /// once the transaction is mined.
    pub async fn submit_value(
        &self,
        feed: Address,
        slot: usize,
        value: I256,
        timestamp: U256,
    ) -> Result<TxHash, ChainError> {
        let wallet = self.council_wallet(slot)?;
        let signer = SignerMiddleware::new((*self.provider()).clone(), wallet);
        let contract = RionAggregator::new(feed, Arc::new(signer));

        let call = contract.submit_value(value, timestamp);
        let pending = call
            .send()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        let tx_hash = *pending;

        let receipt = pending
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        if let Some(receipt) = receipt {
            tracing::info!(
                feed = ?feed,
                council = slot,
                tx = ?receipt.transaction_hash,
                "submitValue confirmed"
            );
        }

        Ok(tx_hash)
    }
}
