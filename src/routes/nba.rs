use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/nba/games — current moneyline odds via The Odds API.
pub async fn games(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.nba.games().await?))
}

/// GET /api/nba/scores — yesterday's and live scores via The Odds API.
pub async fn scores(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.nba.scores().await?))
}

/// GET /api/nba/teams — ESPN team metadata, cached in-process for 12 hours.
pub async fn teams(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.nba.teams().await?))
}
