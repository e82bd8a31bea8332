use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod assets;
pub mod feeds;
pub mod nba;
pub mod receipt;
pub mod rounds;
pub mod submit;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Versioned read API, as documented on the site.
        .route("/api/v1/feeds", get(feeds::list_feeds))
        .route("/api/v1/feeds/:pair", get(feeds::get_feed))
        .route("/api/v1/rounds/:id", get(rounds::get_round_v1))
        // Dashboard round endpoints.
        .route(
            "/api/get-latest-round",
            get(rounds::get_latest_round_query).post(rounds::get_latest_round_body),
        )
        .route("/api/get-round-data", post(rounds::get_round_data))
        .route("/api/store-round", post(rounds::store_round))
        // Price submission.
        .route("/api/submit-price", post(submit::submit_price))
        .route("/api/oracle-automation", post(submit::oracle_automation))
        // Receipts.
        .route("/api/receipt", post(receipt::receipt))
        // NBA proxies.
        .route("/api/nba/games", get(nba::games))
        .route("/api/nba/scores", get(nba::scores))
        .route("/api/nba/teams", get(nba::teams))
        // Templated site assets.
        .route("/embed.js", get(assets::embed_js))
        .route("/robots.txt", get(assets::robots))
        .route("/sitemap.xml", get(assets::sitemap))
        .route("/api/og/round/:id", get(assets::og_round))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
