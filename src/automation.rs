//! Oracle automation: fetch the spot price for every registered feed and
//! submit it on-chain, rotating through the council wallets. Runs as a
//! periodic background loop and on demand via `POST /api/oracle-automation`.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use ethers::types::{I256, U256};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResult {
    pub feed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub council: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SweepResult {
    fn failed(feed: &str, error: impl Into<String>) -> Self {
        Self {
            feed: feed.to_string(),
            price: None,
            council: None,
            tx_hash: None,
            error: Some(error.into()),
        }
    }
}

/// Scale a decimal spot price to the feed's fixed-point representation.
/// Returns `None` when the result does not fit an i128 (it never does for
/// real prices; this guards against garbage upstream data).
pub fn scale_price(price: Decimal, decimals: u8) -> Option<i128> {
    let factor = Decimal::from(10u64.checked_pow(decimals as u32)?);
    price.checked_mul(factor)?.trunc().to_i128()
}

/// One sweep over the registry. Per-feed failures land in the result list,
/// never abort the sweep.
pub async fn run_sweep(state: &AppState) -> Vec<SweepResult> {
    let Some(chain) = state.chain.as_ref() else {
        return state
            .feeds
            .all()
            .iter()
            .map(|f| SweepResult::failed(&f.symbol, "RPC endpoint not configured"))
            .collect();
    };

    let mut results = Vec::with_capacity(state.feeds.all().len());

    for feed in state.feeds.all() {
        let Some(aggregator) = feed.aggregator else {
            results.push(SweepResult::failed(&feed.symbol, "no aggregator configured"));
            continue;
        };

        if chain.council_count() == 0 {
            results.push(SweepResult::failed(&feed.symbol, "no council keys configured"));
            continue;
        }

        let price = match state.spot.price(&feed.binance_symbol).await {
            Ok(price) => price,
            Err(e) => {
                results.push(SweepResult::failed(&feed.symbol, e.to_string()));
                continue;
            }
        };

        let Some(value) = scale_price(price, feed.decimals) else {
            results.push(SweepResult::failed(&feed.symbol, format!("unscalable price {price}")));
            continue;
        };

        let council = state.council_cursor.fetch_add(1, Ordering::Relaxed) % chain.council_count();
        let timestamp = chrono::Utc::now().timestamp() as u64;

        match chain
            .submit_value(aggregator, council, I256::from(value), U256::from(timestamp))
            .await
        {
            Ok(tx_hash) => {
                tracing::info!(feed = %feed.symbol, council, %price, "automation submit ok");
                results.push(SweepResult {
                    feed: feed.symbol.clone(),
                    price: Some(price.to_string()),
                    council: Some(council),
                    tx_hash: Some(format!("{tx_hash:?}")),
                    error: None,
                });
            }
            Err(e) => {
                tracing::error!(feed = %feed.symbol, council, "automation submit failed: {e}");
                results.push(SweepResult {
                    feed: feed.symbol.clone(),
                    price: Some(price.to_string()),
                    council: Some(council),
                    tx_hash: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    results
}

/// Background loop driving sweeps at the configured interval.
pub async fn run_loop(state: Arc<AppState>) {
    let interval = std::time::Duration::from_secs(state.config.automation_interval_secs);
    tracing::info!("automation loop started, interval {interval:?}");

    loop {
        let results = run_sweep(&state).await;
        let submitted = results.iter().filter(|r| r.tx_hash.is_some()).count();
        if submitted > 0 {
            tracing::info!("automation sweep submitted {submitted}/{} feeds", results.len());
        }

        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_to_eight_decimals() {
        let price = "65000.12345678".parse::<Decimal>().unwrap();
        assert_eq!(scale_price(price, 8), Some(6_500_012_345_678));
    }

    #[test]
    fn truncates_extra_precision() {
        let price = "1.999999999".parse::<Decimal>().unwrap();
        assert_eq!(scale_price(price, 2), Some(199));
    }

    #[test]
    fn zero_decimals_is_identity() {
        let price = "42".parse::<Decimal>().unwrap();
        assert_eq!(scale_price(price, 0), Some(42));
    }
}
