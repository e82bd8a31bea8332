use std::env;

/// Runtime configuration, read once at startup. Everything except the port
/// is optional: routes that need a missing piece fail per-request instead of
/// keeping the whole service down.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub public_base_url: String,
    pub rpc_url: Option<String>,
    pub chain_id: u64,
    pub redis_url: Option<String>,
    pub odds_api_key: Option<String>,
    /// Council signing keys, in slot order (COUNCIL_01..COUNCIL_03).
    pub council_keys: Vec<String>,
    pub automation_enabled: bool,
    pub automation_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let council_keys = ["COUNCIL_01_PRIVATE_KEY", "COUNCIL_02_PRIVATE_KEY", "COUNCIL_03_PRIVATE_KEY"]
            .iter()
            .filter_map(|name| env::var(name).ok())
            .filter(|key| !key.is_empty())
            .collect();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "https://rion.network".to_string()),
            rpc_url: env::var("RPC_URL").ok().filter(|v| !v.is_empty()),
            chain_id: env::var("CHAIN_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
            odds_api_key: env::var("ODDS_API_KEY").ok().filter(|v| !v.is_empty()),
            council_keys,
            automation_enabled: env::var("AUTOMATION_ENABLED")
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
            automation_interval_secs: env::var("AUTOMATION_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_forms() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }
}
