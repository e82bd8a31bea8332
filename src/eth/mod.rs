use ethers::prelude::*;
use thiserror::Error;

pub mod client;
pub mod rounds;
pub mod submit;

pub use client::ChainClient;

// The aggregator contracts deployed across networks expose one of three
// interface generations. Reads cascade through them (see rounds.rs).

abigen!(
    AggregatorV3,
    r#"[
        function latestRoundData() external view returns (uint80 roundId, int256 answer, uint256 startedAt, uint256 updatedAt, uint80 answeredInRound)
        function getRoundData(uint80 roundId) external view returns (uint80 roundId, int256 answer, uint256 startedAt, uint256 updatedAt, uint80 answeredInRound)
        function decimals() external view returns (uint8)
        function description() external view returns (string)
    ]"#
);

abigen!(
    RionAggregator,
    r#"[
        function latestRound() external view returns (uint256)
        function rounds(uint256 roundId) external view returns (int256 median, uint256 timestamp)
        function submitValue(int256 value, uint256 timestamp) external
    ]"#
);

abigen!(
    AggregatorLegacy,
    r#"[
        function latestAnswer() external view returns (int256)
        function latestTimestamp() external view returns (uint256)
        function latestRound() external view returns (uint256)
        function getAnswer(uint256 roundId) external view returns (int256)
        function getTimestamp(uint256 roundId) external view returns (uint256)
    ]"#
);

/// A round as read off an aggregator, normalized across the three shapes.
#[derive(Debug, Clone, Copy)]
pub struct OnchainRound {
    pub round_id: u64,
    pub median: i128,
    pub timestamp: u64,
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("contract call error: {0}")]
    Contract(String),

    #[error("no aggregator configured for feed {0}")]
    NotConfigured(String),

    #[error("council key {0} not configured")]
    NoCouncilKey(usize),

    #[error("all aggregator ABI shapes failed, last error: {0}")]
    CascadeExhausted(String),
}
