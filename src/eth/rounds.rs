use ethers::types::{Address, U256};

use super::{AggregatorLegacy, AggregatorV3, ChainClient, ChainError, OnchainRound, RionAggregator};

impl ChainClient {
    /// Read the latest round from `feed`, trying the AggregatorV3 shape,
    /// then the RION native shape, then the legacy one. The first shape
    /// that answers wins.
    pub async fn latest_round(&self, feed: Address) -> Result<OnchainRound, ChainError> {
        let v3_err = match self.latest_v3(feed).await {
            Ok(round) => return Ok(round),
            Err(e) => {
                tracing::debug!("latestRoundData failed for {feed:?}: {e}");
                e
            }
        };

        match self.latest_native(feed).await {
            Ok(round) => return Ok(round),
            Err(e) => tracing::debug!("rounds(latestRound) failed for {feed:?}: {e}"),
        }

        match self.latest_legacy(feed).await {
            Ok(round) => Ok(round),
            Err(e) => {
                tracing::debug!("latestAnswer failed for {feed:?}: {e}");
                // Report the first failure: the v3 shape is what the feeds
                // deployed by this network are expected to speak.
                Err(ChainError::CascadeExhausted(v3_err.to_string()))
            }
        }
    }

    /// Read a specific round by id, through the same cascade.
    pub async fn round_by_id(&self, feed: Address, round_id: u64) -> Result<OnchainRound, ChainError> {
        let v3_err = match self.round_v3(feed, round_id).await {
            Ok(round) => return Ok(round),
            Err(e) => e,
        };

        if let Ok(round) = self.round_native(feed, round_id).await {
            return Ok(round);
        }

        match self.round_legacy(feed, round_id).await {
            Ok(round) => Ok(round),
            Err(_) => Err(ChainError::CascadeExhausted(v3_err.to_string())),
        }
    }

    async fn latest_v3(&self, feed: Address) -> Result<OnchainRound, ChainError> {
        let contract = AggregatorV3::new(feed, self.provider());
        let (round_id, answer, _started_at, updated_at, _answered_in_round) = contract
            .latest_round_data()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;

        Ok(OnchainRound {
            round_id: round_id as u64,
            median: answer.as_i128(),
            timestamp: updated_at.as_u64(),
        })
    }

    async fn round_v3(&self, feed: Address, round_id: u64) -> Result<OnchainRound, ChainError> {
        let contract = AggregatorV3::new(feed, self.provider());
        let (round_id, answer, _started_at, updated_at, _answered_in_round) = contract
            .get_round_data(round_id as u128)
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;

        Ok(OnchainRound {
            round_id: round_id as u64,
            median: answer.as_i128(),
            timestamp: updated_at.as_u64(),
        })
    }

    async fn latest_native(&self, feed: Address) -> Result<OnchainRound, ChainError> {
        let contract = RionAggregator::new(feed, self.provider());
        let round_id = contract
            .latest_round()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;

        self.round_native(feed, round_id.as_u64()).await
    }

    async fn round_native(&self, feed: Address, round_id: u64) -> Result<OnchainRound, ChainError> {
        let contract = RionAggregator::new(feed, self.provider());
        let (median, timestamp) = contract
            .rounds(U256::from(round_id))
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;

        Ok(OnchainRound {
            round_id,
            median: median.as_i128(),
            timestamp: timestamp.as_u64(),
        })
    }

    async fn latest_legacy(&self, feed: Address) -> Result<OnchainRound, ChainError> {
        let contract = AggregatorLegacy::new(feed, self.provider());

        let answer = contract
            .latest_answer()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        let timestamp = contract
            .latest_timestamp()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        let round_id = contract
            .latest_round()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;

        Ok(OnchainRound {
            round_id: round_id.as_u64(),
            median: answer.as_i128(),
            timestamp: timestamp.as_u64(),
        })
    }

    async fn round_legacy(&self, feed: Address, round_id: u64) -> Result<OnchainRound, ChainError> {
        let contract = AggregatorLegacy::new(feed, self.provider());

        let answer = contract
            .get_answer(U256::from(round_id))
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        let timestamp = contract
            .get_timestamp(U256::from(round_id))
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;

        Ok(OnchainRound {
            round_id,
            median: answer.as_i128(),
            timestamp: timestamp.as_u64(),
        })
    }
}
