use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use ethers::types::{I256, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::automation::{self, SweepResult, scale_price};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPriceRequest {
    pub feed: Option<String>,
    pub price: Option<Value>,
    pub council: Option<usize>,
    pub timestamp: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPriceResponse {
    pub feed: String,
    pub council: usize,
    pub value: String,
    pub timestamp: u64,
    pub tx_hash: String,
}

/// POST /api/submit-price — sign `submitValue` with the selected council
/// wallet and send it to the feed's aggregator.
pub async fn submit_price(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitPriceRequest>,
) -> Result<Json<SubmitPriceResponse>, ApiError> {
    let feed_raw = req
        .feed
        .ok_or_else(|| ApiError::BadRequest("feed is required".to_string()))?;
    let info = state
        .feeds
        .resolve(&feed_raw)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown feed symbol {feed_raw}")))?;
    let aggregator = info
        .aggregator
        .ok_or_else(|| ApiError::BadRequest(format!("no aggregator configured for {feed_raw}")))?;

    let price = parse_price(req.price.as_ref())
        .ok_or_else(|| ApiError::BadRequest("price is required as a positive decimal".to_string()))?;
    let value = scale_price(price, info.decimals)
        .ok_or_else(|| ApiError::BadRequest(format!("price {price} does not scale")))?;

    let council = req.council.unwrap_or(0);
    let timestamp = req
        .timestamp
        .unwrap_or_else(|| chrono::Utc::now().timestamp() as u64);

    let chain = state
        .chain
        .as_ref()
        .ok_or_else(|| ApiError::Upstream("RPC endpoint not configured".to_string()))?;

    let tx_hash = chain
        .submit_value(aggregator, council, I256::from(value), U256::from(timestamp))
        .await?;

    Ok(Json(SubmitPriceResponse {
        feed: info.symbol.clone(),
        council,
        value: value.to_string(),
        timestamp,
        tx_hash: format!("{tx_hash:?}"),
    }))
}

/// POST /api/oracle-automation — run one sweep over the registry. Per-feed
/// failures are reported in the body, not as an HTTP error.
pub async fn oracle_automation(
    State(state): State<Arc<AppState>>,
) -> Json<AutomationResponse> {
    let results = automation::run_sweep(&state).await;
    let submitted = results.iter().filter(|r| r.tx_hash.is_some()).count();

    Json(AutomationResponse { submitted, results })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationResponse {
    pub submitted: usize,
    pub results: Vec<SweepResult>,
}

fn parse_price(value: Option<&Value>) -> Option<Decimal> {
    let price = match value? {
        Value::String(s) => s.trim().parse::<Decimal>().ok()?,
        Value::Number(n) => n.to_string().parse::<Decimal>().ok()?,
        _ => return None,
    };

    (price > Decimal::ZERO).then_some(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_price_accepts_numbers_and_strings() {
        assert_eq!(
            parse_price(Some(&json!("65000.5"))),
            Some("65000.5".parse().unwrap())
        );
        assert_eq!(parse_price(Some(&json!(42))), Some(Decimal::from(42)));
        assert_eq!(parse_price(Some(&json!("0"))), None);
        assert_eq!(parse_price(Some(&json!("-1"))), None);
        assert_eq!(parse_price(Some(&json!("abc"))), None);
        assert_eq!(parse_price(None), None);
    }
}
