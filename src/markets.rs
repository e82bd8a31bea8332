//! Binance spot price client, feeding the ticker endpoints and the oracle
//! automation sweep.

use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

const BINANCE_API_BASE: &str = "https://api.binance.com";

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("spot request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("spot API returned status {0}")]
    Status(u16),

    #[error("unparseable spot price {0:?}")]
    Parse(String),
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    #[allow(dead_code)]
    symbol: String,
    price: String,
}

#[derive(Clone)]
pub struct SpotClient {
    http: reqwest::Client,
    base: String,
}

impl SpotClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base: BINANCE_API_BASE.to_string(),
        }
    }

    /// Spot price for one Binance ticker symbol (e.g. `BTCUSDT`).
    pub async fn price(&self, binance_symbol: &str) -> Result<Decimal, MarketError> {
        let url = format!("{}/api/v3/ticker/price", self.base);
        let resp = self
            .http
            .get(&url)
            .query(&[("symbol", binance_symbol)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(MarketError::Status(resp.status().as_u16()));
        }

        let ticker: TickerPrice = resp.json().await?;
        ticker
            .price
            .parse::<Decimal>()
            .map_err(|_| MarketError::Parse(ticker.price))
    }

    /// Fetch several symbols concurrently. A failed fetch yields `None` for
    /// that slot so one flaky pair cannot sink a feed listing.
    pub async fn prices(&self, binance_symbols: &[String]) -> Vec<Option<Decimal>> {
        let fetches = binance_symbols.iter().map(|symbol| async move {
            match self.price(symbol).await {
                Ok(price) => Some(price),
                Err(e) => {
                    tracing::warn!("spot fetch for {symbol} failed: {e}");
                    None
                }
            }
        });

        join_all(fetches).await
    }
}
