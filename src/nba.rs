//! NBA data proxies: betting lines and scores from The Odds API, team
//! metadata from ESPN. Team metadata barely changes, so it is held in a
//! process-wide slot for 12 hours after a successful fetch.

use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

const ODDS_API_BASE: &str = "https://api.the-odds-api.com/v4/sports/basketball_nba";
const ESPN_TEAMS_URL: &str =
    "https://site.api.espn.com/apis/site/v2/sports/basketball/nba/teams";

pub const TEAM_CACHE_TTL: Duration = Duration::from_secs(12 * 3600);

#[derive(Debug, Error)]
pub enum NbaError {
    #[error("ODDS_API_KEY not configured")]
    MissingApiKey,

    #[error("NBA upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("NBA upstream returned status {0}")]
    Status(u16),
}

struct TeamCacheEntry {
    fetched_at: Instant,
    body: Value,
}

pub struct NbaClient {
    http: reqwest::Client,
    odds_api_key: Option<String>,
    teams: RwLock<Option<TeamCacheEntry>>,
}

pub(crate) fn cache_entry_fresh(age: Duration, ttl: Duration) -> bool {
    age < ttl
}

impl NbaClient {
    pub fn new(http: reqwest::Client, odds_api_key: Option<String>) -> Self {
        Self {
            http,
            odds_api_key,
            teams: RwLock::new(None),
        }
    }

    /// Current NBA moneyline odds.
    pub async fn games(&self) -> Result<Value, NbaError> {
        let key = self.odds_api_key.as_deref().ok_or(NbaError::MissingApiKey)?;
        self.fetch_json(
            &format!("{ODDS_API_BASE}/odds"),
            &[
                ("apiKey", key),
                ("regions", "us"),
                ("markets", "h2h"),
                ("oddsFormat", "american"),
            ],
        )
        .await
    }

    /// Scores for games in the last day.
    pub async fn scores(&self) -> Result<Value, NbaError> {
        let key = self.odds_api_key.as_deref().ok_or(NbaError::MissingApiKey)?;
        self.fetch_json(
            &format!("{ODDS_API_BASE}/scores"),
            &[("apiKey", key), ("daysFrom", "1")],
        )
        .await
    }

    /// Team metadata, served from the in-memory slot while fresh.
    pub async fn teams(&self) -> Result<Value, NbaError> {
        {
            let slot = self.teams.read().await;
            if let Some(entry) = slot.as_ref() {
                if cache_entry_fresh(entry.fetched_at.elapsed(), TEAM_CACHE_TTL) {
                    return Ok(entry.body.clone());
                }
            }
        }

        let body = self.fetch_json(ESPN_TEAMS_URL, &[]).await?;

        let mut slot = self.teams.write().await;
        *slot = Some(TeamCacheEntry {
            fetched_at: Instant::now(),
            body: body.clone(),
        });

        Ok(body)
    }

    async fn fetch_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, NbaError> {
        let resp = self.http.get(url).query(query).send().await?;
        if !resp.status().is_success() {
            return Err(NbaError::Status(resp.status().as_u16()));
        }
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_respects_the_ttl() {
        assert!(cache_entry_fresh(Duration::from_secs(0), TEAM_CACHE_TTL));
        assert!(cache_entry_fresh(
            Duration::from_secs(12 * 3600 - 1),
            TEAM_CACHE_TTL
        ));
        assert!(!cache_entry_fresh(
            Duration::from_secs(12 * 3600),
            TEAM_CACHE_TTL
        ));
    }

    #[tokio::test]
    async fn teams_cache_round_trips_the_stored_body() {
        let client = NbaClient::new(reqwest::Client::new(), None);
        let body = serde_json::json!({"teams": ["Celtics", "Lakers"]});

        {
            let mut slot = client.teams.write().await;
            *slot = Some(TeamCacheEntry {
                fetched_at: Instant::now(),
                body: body.clone(),
            });
        }

        // While fresh, the cached body is returned without touching ESPN.
        assert_eq!(client.teams().await.unwrap(), body);
        assert_eq!(client.teams().await.unwrap(), body);
    }
}
