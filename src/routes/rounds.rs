use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ethers::types::Address;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::eth::OnchainRound;
use crate::feeds::{FeedRegistry, normalize_symbol};
use crate::state::AppState;
use crate::types::{LatestRound, RoundChecks, RoundData, RoundVerification};

/// Rounds older than this are flagged stale.
const FRESHNESS_WINDOW_MS: u64 = 5 * 60 * 1000;
/// Sanity ceiling on scaled prices; anything at or above is treated as a
/// corrupt submission.
const MAX_PLAUSIBLE_PRICE: i64 = 10_000_000;

// ---------------------------------------------------------------------------
// GET|POST /api/get-latest-round
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestRoundParams {
    pub symbol: Option<String>,
    pub feed_address: Option<String>,
}

pub async fn get_latest_round_query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LatestRoundParams>,
) -> Result<Json<LatestRound>, ApiError> {
    latest_round(&state, params).await.map(Json)
}

pub async fn get_latest_round_body(
    State(state): State<Arc<AppState>>,
    Json(params): Json<LatestRoundParams>,
) -> Result<Json<LatestRound>, ApiError> {
    latest_round(&state, params).await.map(Json)
}

async fn latest_round(state: &AppState, params: LatestRoundParams) -> Result<LatestRound, ApiError> {
    let address = resolve_aggregator(&state.feeds, &params)?;
    let chain = state
        .chain
        .as_ref()
        .ok_or_else(|| ApiError::Upstream("RPC endpoint not configured".to_string()))?;

    let round = chain.latest_round(address).await?;
    Ok(LatestRound {
        round_id: round.round_id.to_string(),
        median: round.median.to_string(),
        timestamp: round.timestamp,
    })
}

fn resolve_aggregator(feeds: &FeedRegistry, params: &LatestRoundParams) -> Result<Address, ApiError> {
    if let Some(symbol) = params.symbol.as_deref() {
        let info = feeds
            .resolve(symbol)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown feed symbol {symbol}")))?;
        return info
            .aggregator
            .ok_or_else(|| ApiError::BadRequest(format!("no aggregator configured for {symbol}")));
    }

    if let Some(raw) = params.feed_address.as_deref() {
        return raw
            .parse::<Address>()
            .map_err(|_| ApiError::BadRequest(format!("invalid feed address {raw}")));
    }

    Err(ApiError::BadRequest("symbol or feedAddress is required".to_string()))
}

// ---------------------------------------------------------------------------
// POST /api/get-round-data and GET /api/v1/rounds/:id
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundDataRequest {
    pub feed: Option<String>,
    pub round_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoundQuery {
    pub feed: Option<String>,
}

pub async fn get_round_data(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RoundDataRequest>,
) -> Result<Response, ApiError> {
    let feed = req
        .feed
        .ok_or_else(|| ApiError::BadRequest("feed is required".to_string()))?;
    let round_id = req.round_id.unwrap_or_else(|| "latest".to_string());
    lookup_round(&state, &feed, &round_id).await
}

pub async fn get_round_v1(
    State(state): State<Arc<AppState>>,
    Path(round_id): Path<String>,
    Query(query): Query<RoundQuery>,
) -> Result<Response, ApiError> {
    let feed = query
        .feed
        .ok_or_else(|| ApiError::BadRequest("feed query parameter is required".to_string()))?;
    lookup_round(&state, &feed, &round_id).await
}

/// Cache first, then the on-chain aggregator; 404 `{ exists: false }` when
/// neither source has the round.
async fn lookup_round(state: &AppState, feed: &str, round_id: &str) -> Result<Response, ApiError> {
    if round_id != "latest" && round_id.parse::<u64>().is_err() {
        return Err(ApiError::BadRequest(format!("invalid roundId {round_id}")));
    }

    let symbol = normalize_symbol(feed);
    let decimals = state.feeds.resolve(feed).map(|f| f.decimals).unwrap_or(8);

    let cached = if round_id == "latest" {
        state.cache.latest_round(&symbol).await
    } else {
        state.cache.get_round(&symbol, round_id).await
    };

    match cached {
        Ok(Some(round)) => {
            let payload = verification_payload(round, decimals, "cache", now_ms());
            return Ok(Json(payload).into_response());
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("cache read for {symbol}:{round_id} failed: {e}"),
    }

    if let (Some(chain), Some(address)) = (
        state.chain.as_ref(),
        state.feeds.resolve(feed).and_then(|f| f.aggregator),
    ) {
        let read = if round_id == "latest" {
            chain.latest_round(address).await
        } else {
            // Checked above.
            chain.round_by_id(address, round_id.parse().unwrap_or_default()).await
        };

        match read {
            Ok(round) => {
                let round = onchain_to_round(&symbol, round);
                let payload = verification_payload(round, decimals, "chain", now_ms());
                return Ok(Json(payload).into_response());
            }
            Err(e) => tracing::warn!("chain read for {symbol}:{round_id} failed: {e}"),
        }
    }

    Ok((
        StatusCode::NOT_FOUND,
        Json(json!({ "exists": false, "error": "round not found" })),
    )
        .into_response())
}

fn onchain_to_round(symbol: &str, round: OnchainRound) -> RoundData {
    RoundData {
        feed: symbol.to_string(),
        round_id: round.round_id.to_string(),
        median: round.median.to_string(),
        timestamp: round.timestamp,
        councils: Vec::new(),
        tx_hash: None,
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

fn verification_payload(round: RoundData, decimals: u8, source: &str, now_ms: u64) -> RoundVerification {
    let price_valid = price_valid(&round.median, decimals);
    let freshness_ms = now_ms.saturating_sub(round.timestamp.saturating_mul(1000));
    let fresh = freshness_ms < FRESHNESS_WINDOW_MS;

    RoundVerification {
        exists: true,
        source: source.to_string(),
        round,
        verified: price_valid,
        fresh,
        checks: RoundChecks {
            price_valid,
            freshness_ms,
        },
    }
}

/// Scaled price must be strictly positive and under the plausibility
/// ceiling.
fn price_valid(median: &str, decimals: u8) -> bool {
    let Ok(raw) = median.parse::<i128>() else {
        return false;
    };
    let Ok(price) = Decimal::try_from_i128_with_scale(raw, decimals as u32) else {
        return false;
    };

    price > Decimal::ZERO && price < Decimal::from(MAX_PLAUSIBLE_PRICE)
}

// ---------------------------------------------------------------------------
// POST /api/store-round
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRoundRequest {
    pub feed: Option<String>,
    pub round_id: Option<Value>,
    pub median: Option<Value>,
    pub councils: Option<Vec<String>>,
    pub timestamp: Option<u64>,
    pub tx_hash: Option<String>,
}

pub async fn store_round(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StoreRoundRequest>,
) -> Result<Json<Value>, ApiError> {
    let round = validate_store_round(req, chrono::Utc::now().timestamp() as u64)
        .map_err(ApiError::BadRequest)?;

    let key = state.cache.put_round(&round).await?;
    tracing::info!("stored round {key}");

    Ok(Json(json!({ "status": "stored", "key": key })))
}

/// JS clients send medians and round ids as either numbers or strings;
/// accept both, reject everything else.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn validate_store_round(req: StoreRoundRequest, now_secs: u64) -> Result<RoundData, String> {
    let feed = req
        .feed
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .ok_or("feed is required")?;

    let round_id = req
        .round_id
        .as_ref()
        .and_then(scalar_string)
        .ok_or("roundId is required")?;

    let median = req
        .median
        .as_ref()
        .and_then(scalar_string)
        .ok_or("median is required")?;

    let councils = req.councils.filter(|c| !c.is_empty()).ok_or("councils is required")?;

    Ok(RoundData {
        feed: normalize_symbol(feed),
        round_id,
        median,
        timestamp: req.timestamp.unwrap_or(now_secs),
        councils,
        tx_hash: req.tx_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(median: &str, timestamp: u64) -> RoundData {
        RoundData {
            feed: "BTC".into(),
            round_id: "42".into(),
            median: median.into(),
            timestamp,
            councils: vec!["council-01".into()],
            tx_hash: None,
        }
    }

    #[test]
    fn price_validity_bounds() {
        // 65000.00000000 at 8 decimals.
        assert!(price_valid("6500000000000", 8));
        assert!(!price_valid("0", 8));
        assert!(!price_valid("-100000000", 8));
        // Exactly 10_000_000 is out of range.
        assert!(!price_valid("1000000000000000", 8));
        // Just under the ceiling is fine.
        assert!(price_valid("999999999999999", 8));
        assert!(!price_valid("not-a-number", 8));
    }

    #[test]
    fn freshness_window_is_five_minutes() {
        let ts = 1_700_000_000u64;
        let now = ts * 1000;

        let fresh = verification_payload(round("6500000000000", ts), 8, "cache", now + 299_999);
        assert!(fresh.fresh);

        let stale = verification_payload(round("6500000000000", ts), 8, "cache", now + 300_000);
        assert!(!stale.fresh);
        assert_eq!(stale.checks.freshness_ms, 300_000);
    }

    #[test]
    fn verified_tracks_price_validity() {
        let ok = verification_payload(round("6500000000000", 0), 8, "cache", 0);
        assert!(ok.verified && ok.checks.price_valid);

        let bad = verification_payload(round("0", 0), 8, "cache", 0);
        assert!(!bad.verified && !bad.checks.price_valid);
        assert!(bad.exists);
    }

    #[test]
    fn store_round_requires_all_fields() {
        let full = StoreRoundRequest {
            feed: Some("BTC/USD".into()),
            round_id: Some(json!(42)),
            median: Some(json!("6500000000000")),
            councils: Some(vec!["council-01".into()]),
            timestamp: None,
            tx_hash: None,
        };
        let data = validate_store_round(full, 1_700_000_000).unwrap();
        assert_eq!(data.feed, "BTC");
        assert_eq!(data.round_id, "42");
        assert_eq!(data.timestamp, 1_700_000_000);

        let missing_median = StoreRoundRequest {
            feed: Some("BTC".into()),
            round_id: Some(json!("42")),
            median: None,
            councils: Some(vec!["council-01".into()]),
            timestamp: None,
            tx_hash: None,
        };
        assert_eq!(
            validate_store_round(missing_median, 0).unwrap_err(),
            "median is required"
        );

        let empty_councils = StoreRoundRequest {
            feed: Some("BTC".into()),
            round_id: Some(json!("42")),
            median: Some(json!(1)),
            councils: Some(vec![]),
            timestamp: None,
            tx_hash: None,
        };
        assert_eq!(
            validate_store_round(empty_councils, 0).unwrap_err(),
            "councils is required"
        );

        let missing_feed = StoreRoundRequest {
            feed: None,
            round_id: Some(json!("42")),
            median: Some(json!(1)),
            councils: Some(vec!["c".into()]),
            timestamp: None,
            tx_hash: None,
        };
        assert_eq!(validate_store_round(missing_feed, 0).unwrap_err(), "feed is required");

        let missing_round_id = StoreRoundRequest {
            feed: Some("BTC".into()),
            round_id: None,
            median: Some(json!(1)),
            councils: Some(vec!["c".into()]),
            timestamp: None,
            tx_hash: None,
        };
        assert_eq!(
            validate_store_round(missing_round_id, 0).unwrap_err(),
            "roundId is required"
        );
    }

    #[test]
    fn latest_round_requires_a_known_target() {
        let feeds = FeedRegistry::from_env();

        let none = LatestRoundParams::default();
        assert!(matches!(
            resolve_aggregator(&feeds, &none),
            Err(ApiError::BadRequest(_))
        ));

        let unknown = LatestRoundParams {
            symbol: Some("DOGE".into()),
            feed_address: None,
        };
        assert!(matches!(
            resolve_aggregator(&feeds, &unknown),
            Err(ApiError::BadRequest(_))
        ));

        let by_address = LatestRoundParams {
            symbol: None,
            feed_address: Some("0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419".into()),
        };
        assert!(resolve_aggregator(&feeds, &by_address).is_ok());

        let bad_address = LatestRoundParams {
            symbol: None,
            feed_address: Some("not-an-address".into()),
        };
        assert!(matches!(
            resolve_aggregator(&feeds, &bad_address),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn scalar_string_accepts_numbers_and_strings() {
        assert_eq!(scalar_string(&json!(42)), Some("42".to_string()));
        assert_eq!(scalar_string(&json!("42")), Some("42".to_string()));
        assert_eq!(scalar_string(&json!("  7 ")), Some("7".to_string()));
        assert_eq!(scalar_string(&json!("")), None);
        assert_eq!(scalar_string(&json!(null)), None);
        assert_eq!(scalar_string(&json!([1])), None);
    }
}
