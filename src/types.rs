use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One timestamped price record for a feed, as cached in Redis and returned
/// by the round endpoints. Medians are kept as decimal strings so the raw
/// fixed-point contract answer survives JSON round-trips untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundData {
    pub feed: String,
    pub round_id: String,
    pub median: String,
    /// Epoch seconds, as reported by the aggregator.
    pub timestamp: u64,
    #[serde(default)]
    pub councils: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

/// Shape returned by `/api/get-latest-round`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestRound {
    pub round_id: String,
    pub median: String,
    pub timestamp: u64,
}

/// Verification payload for `/api/get-round-data` and `/api/v1/rounds/:id`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundVerification {
    pub exists: bool,
    pub source: String,
    pub round: RoundData,
    pub verified: bool,
    pub fresh: bool,
    pub checks: RoundChecks,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundChecks {
    pub price_valid: bool,
    pub freshness_ms: u64,
}

/// Client-facing delivery receipt. The hash anchors the round tuple, the
/// proof is the SHA-256 sibling path of the first leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub receipt_id: Uuid,
    pub feed: String,
    pub round_id: String,
    pub median: String,
    pub timestamp: u64,
    pub hash: String,
    pub root: String,
    pub proof: Vec<String>,
    pub depth: usize,
    pub issued_at: DateTime<Utc>,
}
