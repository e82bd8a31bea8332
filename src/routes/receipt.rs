use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rounds::scalar_string;
use crate::error::ApiError;
use crate::feeds::normalize_symbol;
use crate::receipt::build_receipt;
use crate::state::AppState;
use crate::types::Receipt;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    pub action: Option<String>,
    // generate
    pub feed: Option<String>,
    pub round_id: Option<Value>,
    pub median: Option<Value>,
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub councils: Vec<String>,
    // verify
    pub hash: Option<String>,
    pub proof: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReceiptResponse {
    Generated(Box<Receipt>),
    Verified(VerifyResponse),
}

/// POST /api/receipt — `action: "generate"` builds and stores a delivery
/// receipt for a round; `action: "verify"` checks a previously issued one.
/// Verification is a shape check: the receipt must exist and the submitted
/// proof must have the depth recorded at generation time.
pub async fn receipt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReceiptRequest>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    match req.action.as_deref().unwrap_or("generate") {
        "generate" => generate(&state, req).await,
        "verify" => verify(&state, req).await,
        other => Err(ApiError::BadRequest(format!("unknown action {other}"))),
    }
}

async fn generate(state: &AppState, req: ReceiptRequest) -> Result<Json<ReceiptResponse>, ApiError> {
    let feed = req
        .feed
        .as_deref()
        .map(normalize_symbol)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::BadRequest("feed is required".to_string()))?;
    let round_id = req
        .round_id
        .as_ref()
        .and_then(scalar_string)
        .ok_or_else(|| ApiError::BadRequest("roundId is required".to_string()))?;
    let median = req
        .median
        .as_ref()
        .and_then(scalar_string)
        .ok_or_else(|| ApiError::BadRequest("median is required".to_string()))?;
    let timestamp = req
        .timestamp
        .unwrap_or_else(|| chrono::Utc::now().timestamp() as u64);

    let receipt = build_receipt(&feed, &round_id, &median, timestamp, &req.councils);
    state.cache.put_receipt(&receipt).await?;
    tracing::info!("issued receipt {} for {feed}:{round_id}", receipt.hash);

    Ok(Json(ReceiptResponse::Generated(Box::new(receipt))))
}

async fn verify(state: &AppState, req: ReceiptRequest) -> Result<Json<ReceiptResponse>, ApiError> {
    let hash = req
        .hash
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ApiError::BadRequest("hash is required".to_string()))?;
    let proof = req
        .proof
        .ok_or_else(|| ApiError::BadRequest("proof is required".to_string()))?;

    let stored = state.cache.get_receipt(&hash).await?;
    let response = match stored {
        Some(receipt) => VerifyResponse {
            valid: proof.len() == receipt.depth,
            expected_depth: Some(receipt.depth),
            reason: (proof.len() != receipt.depth).then(|| "proof depth mismatch".to_string()),
        },
        None => VerifyResponse {
            valid: false,
            expected_depth: None,
            reason: Some("unknown receipt".to_string()),
        },
    };

    Ok(Json(ReceiptResponse::Verified(response)))
}
