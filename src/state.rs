use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use crate::cache::RoundCache;
use crate::config::Config;
use crate::eth::ChainClient;
use crate::feeds::FeedRegistry;
use crate::markets::SpotClient;
use crate::nba::NbaClient;

pub struct AppState {
    pub config: Config,
    pub feeds: FeedRegistry,
    pub cache: RoundCache,
    /// Absent when no RPC endpoint is configured; chain routes then fail
    /// per-request.
    pub chain: Option<ChainClient>,
    pub spot: SpotClient,
    pub nba: NbaClient,
    /// Round-robin cursor over the council wallets for automation sweeps.
    pub council_cursor: AtomicUsize,
}

impl AppState {
    pub async fn build(config: Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");

        let feeds = FeedRegistry::from_env();
        let cache = RoundCache::connect(config.redis_url.as_deref()).await;
        let chain = ChainClient::from_config(&config);
        if chain.is_none() {
            tracing::warn!("RPC_URL not set, chain routes disabled");
        }

        let spot = SpotClient::new(http.clone());
        let nba = NbaClient::new(http, config.odds_api_key.clone());

        Self {
            config,
            feeds,
            cache,
            chain,
            spot,
            nba,
            council_cursor: AtomicUsize::new(0),
        }
    }
}
