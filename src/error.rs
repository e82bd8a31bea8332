use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::cache::CacheError;
use crate::eth::ChainError;
use crate::markets::MarketError;
use crate::nba::NbaError;

/// Error surface for every route handler. Converts into the JSON body
/// `{ "error": ..., "details": ... }` the dashboard expects.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// RPC, Redis or third-party API failure.
    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Upstream(msg) => {
                (StatusCode::BAD_GATEWAY, "upstream failure".to_string(), Some(msg))
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
                Some(msg),
            ),
        };

        tracing::error!(%status, error, ?details, "request failed");

        (status, Json(ErrorBody { error, details })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(e: ChainError) -> Self {
        match e {
            ChainError::NotConfigured(_) | ChainError::NoCouncilKey(_) => {
                ApiError::BadRequest(e.to_string())
            }
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(e: CacheError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

impl From<MarketError> for ApiError {
    fn from(e: MarketError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

impl From<NbaError> for ApiError {
    fn from(e: NbaError) -> Self {
        match e {
            NbaError::MissingApiKey => ApiError::Internal(e.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Upstream("x".into()), StatusCode::BAD_GATEWAY),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn council_key_errors_are_client_errors() {
        let err: ApiError = ChainError::NoCouncilKey(2).into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = ChainError::Rpc("timeout".into()).into();
        assert!(matches!(err, ApiError::Upstream(_)));
    }
}
