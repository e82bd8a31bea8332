//! Redis-backed round and receipt cache.
//!
//! Key format: `round:{feed}:{roundId}` and `receipt:{hash}`, values are
//! JSON documents. The connection is optional: when Redis is unreachable the
//! gateway keeps serving chain reads and reports cache writes as upstream
//! failures.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use thiserror::Error;

use crate::types::{Receipt, RoundData};

/// TTLs in seconds.
pub mod ttl {
    /// Cached rounds live 7 days.
    pub const ROUND: u64 = 7 * 24 * 3600;
    /// Receipts live 30 days.
    pub const RECEIPT: u64 = 30 * 24 * 3600;
}

pub fn round_key(feed: &str, round_id: &str) -> String {
    format!("round:{feed}:{round_id}")
}

pub fn latest_round_key(feed: &str) -> String {
    round_key(feed, "latest")
}

pub fn receipt_key(hash: &str) -> String {
    format!("receipt:{hash}")
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache not available")]
    NotAvailable,

    #[error("cache operation failed: {0}")]
    Operation(#[from] redis::RedisError),

    #[error("cache serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct RoundCache {
    conn: Option<ConnectionManager>,
}

impl RoundCache {
    /// Connect to Redis, degrading gracefully when the URL is absent or the
    /// server is unreachable.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else {
            tracing::warn!("REDIS_URL not set, round cache disabled");
            return Self { conn: None };
        };

        let client = match redis::Client::open(url) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("invalid REDIS_URL: {e}");
                return Self { conn: None };
            }
        };

        match ConnectionManager::new(client).await {
            Ok(conn) => {
                tracing::info!("round cache connected");
                Self { conn: Some(conn) }
            }
            Err(e) => {
                tracing::warn!("Redis unreachable, round cache disabled: {e}");
                Self { conn: None }
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    pub async fn get_round(&self, feed: &str, round_id: &str) -> Result<Option<RoundData>, CacheError> {
        self.get_json(&round_key(feed, round_id)).await
    }

    pub async fn latest_round(&self, feed: &str) -> Result<Option<RoundData>, CacheError> {
        self.get_json(&latest_round_key(feed)).await
    }

    /// Store a round under its id and mirror it to the feed's `latest` slot.
    pub async fn put_round(&self, round: &RoundData) -> Result<String, CacheError> {
        let mut conn = self.conn.clone().ok_or(CacheError::NotAvailable)?;
        let payload = serde_json::to_string(round)?;
        let key = round_key(&round.feed, &round.round_id);

        conn.set_ex::<_, _, ()>(&key, &payload, ttl::ROUND).await?;
        conn.set_ex::<_, _, ()>(&latest_round_key(&round.feed), &payload, ttl::ROUND)
            .await?;

        Ok(key)
    }

    pub async fn get_receipt(&self, hash: &str) -> Result<Option<Receipt>, CacheError> {
        self.get_json(&receipt_key(hash)).await
    }

    pub async fn put_receipt(&self, receipt: &Receipt) -> Result<(), CacheError> {
        let mut conn = self.conn.clone().ok_or(CacheError::NotAvailable)?;
        let payload = serde_json::to_string(receipt)?;
        conn.set_ex::<_, _, ()>(&receipt_key(&receipt.hash), &payload, ttl::RECEIPT)
            .await?;
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(conn) = self.conn.clone() else {
            return Ok(None);
        };
        let mut conn = conn;

        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_render_the_documented_format() {
        assert_eq!(round_key("BTC", "42"), "round:BTC:42");
        assert_eq!(latest_round_key("ETH"), "round:ETH:latest");
        assert_eq!(receipt_key("abc123"), "receipt:abc123");
    }

    #[test]
    fn ttls_match_the_retention_policy() {
        assert_eq!(ttl::ROUND, 604_800);
        assert_eq!(ttl::RECEIPT, 2_592_000);
    }

    #[tokio::test]
    async fn disabled_cache_reads_as_miss() {
        let cache = RoundCache { conn: None };
        assert!(!cache.is_available());
        assert!(cache.get_round("BTC", "1").await.unwrap().is_none());
        assert!(cache.latest_round("BTC").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn disabled_cache_rejects_writes() {
        let cache = RoundCache { conn: None };
        let round = RoundData {
            feed: "BTC".into(),
            round_id: "1".into(),
            median: "100".into(),
            timestamp: 0,
            councils: vec![],
            tx_hash: None,
        };
        assert!(matches!(
            cache.put_round(&round).await,
            Err(CacheError::NotAvailable)
        ));
    }
}
