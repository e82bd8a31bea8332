pub mod automation;
pub mod cache;
pub mod config;
pub mod error;
pub mod eth;
pub mod feeds;
pub mod markets;
pub mod nba;
pub mod receipt;
pub mod routes;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::Router;
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    routes::router(state)
}
