use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::LatestRound;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSummary {
    pub pair: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregator: Option<String>,
    pub spot_price: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedsResponse {
    pub feeds: Vec<FeedSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedDetail {
    #[serde(flatten)]
    pub summary: FeedSummary,
    pub latest_round: Option<LatestRound>,
}

/// GET /api/v1/feeds — all registered feeds with their spot prices, fetched
/// in parallel. A failed spot fetch shows up as `null`, never as an error.
pub async fn list_feeds(State(state): State<Arc<AppState>>) -> Json<FeedsResponse> {
    let symbols: Vec<String> = state
        .feeds
        .all()
        .iter()
        .map(|f| f.binance_symbol.clone())
        .collect();
    let spots = state.spot.prices(&symbols).await;

    let feeds = state
        .feeds
        .all()
        .iter()
        .zip(spots)
        .map(|(info, spot)| FeedSummary {
            pair: info.pair.clone(),
            symbol: info.symbol.clone(),
            decimals: info.decimals,
            aggregator: info.aggregator.map(|a| format!("{a:?}")),
            spot_price: spot.map(|p| p.to_string()),
        })
        .collect();

    Json(FeedsResponse { feeds })
}

/// GET /api/v1/feeds/:pair — registry info, spot price, and the latest
/// on-chain round when an aggregator is configured.
pub async fn get_feed(
    State(state): State<Arc<AppState>>,
    Path(pair): Path<String>,
) -> Result<Json<FeedDetail>, ApiError> {
    let info = state
        .feeds
        .resolve(&pair)
        .ok_or_else(|| ApiError::NotFound(format!("unknown feed {pair}")))?
        .clone();

    let spot = state.spot.price(&info.binance_symbol).await.ok();

    let latest_round = match (state.chain.as_ref(), info.aggregator) {
        (Some(chain), Some(address)) => match chain.latest_round(address).await {
            Ok(round) => Some(LatestRound {
                round_id: round.round_id.to_string(),
                median: round.median.to_string(),
                timestamp: round.timestamp,
            }),
            Err(e) => {
                tracing::warn!("latest round read for {} failed: {e}", info.symbol);
                None
            }
        },
        _ => None,
    };

    Ok(Json(FeedDetail {
        summary: FeedSummary {
            pair: info.pair,
            symbol: info.symbol,
            decimals: info.decimals,
            aggregator: info.aggregator.map(|a| format!("{a:?}")),
            spot_price: spot.map(|p| p.to_string()),
        },
        latest_round,
    }))
}
