use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rion_gateway::automation;
use rion_gateway::config::Config;
use rion_gateway::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rion_gateway=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env();
    let port = config.port;
    let automation_enabled = config.automation_enabled;

    tracing::info!("starting RION gateway v{}", env!("CARGO_PKG_VERSION"));

    let state = Arc::new(AppState::build(config).await);

    if automation_enabled {
        tokio::spawn(automation::run_loop(state.clone()));
    } else {
        tracing::info!("automation loop disabled");
    }

    let app = rion_gateway::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
