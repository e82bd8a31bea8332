use ethers::types::Address;

/// A registered price feed: pair metadata plus the aggregator address, when
/// one is configured for this deployment.
#[derive(Debug, Clone)]
pub struct FeedInfo {
    pub symbol: String,
    pub pair: String,
    pub binance_symbol: String,
    pub decimals: u8,
    pub aggregator: Option<Address>,
}

/// Registry of the feeds the gateway serves. Addresses come from
/// `{SYMBOL}_AGGREGATOR_ADDRESS`; a feed without one is still listed so the
/// ticker can show its spot price, but chain operations against it fail.
#[derive(Debug, Clone)]
pub struct FeedRegistry {
    feeds: Vec<FeedInfo>,
}

const BUILTIN_SYMBOLS: [&str; 5] = ["BTC", "ETH", "BNB", "SOL", "LINK"];

impl FeedRegistry {
    pub fn from_env() -> Self {
        let feeds = BUILTIN_SYMBOLS
            .iter()
            .map(|symbol| {
                let var = format!("{symbol}_AGGREGATOR_ADDRESS");
                let aggregator = std::env::var(&var).ok().and_then(|raw| {
                    match raw.parse::<Address>() {
                        Ok(addr) => Some(addr),
                        Err(e) => {
                            tracing::warn!("ignoring malformed {var}: {e}");
                            None
                        }
                    }
                });

                FeedInfo {
                    symbol: symbol.to_string(),
                    pair: format!("{symbol}/USD"),
                    binance_symbol: format!("{symbol}USDT"),
                    decimals: 8,
                    aggregator,
                }
            })
            .collect();

        Self { feeds }
    }

    pub fn all(&self) -> &[FeedInfo] {
        &self.feeds
    }

    /// Look up a feed by any accepted symbol form (`btc`, `BTC/USD`,
    /// `BTCUSD`, ...).
    pub fn resolve(&self, symbol: &str) -> Option<&FeedInfo> {
        let normalized = normalize_symbol(symbol);
        self.feeds.iter().find(|f| f.symbol == normalized)
    }
}

/// Normalize the symbol forms clients send: case-insensitive, with or
/// without a quote-currency suffix or separator.
pub fn normalize_symbol(raw: &str) -> String {
    let mut s: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_' | ' '))
        .collect::<String>()
        .to_uppercase();

    for suffix in ["USDT", "USD"] {
        if s.len() > suffix.len() && s.ends_with(suffix) {
            s.truncate(s.len() - suffix.len());
            break;
        }
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_accepts_common_forms() {
        assert_eq!(normalize_symbol("btc"), "BTC");
        assert_eq!(normalize_symbol("BTC/USD"), "BTC");
        assert_eq!(normalize_symbol("btc-usd"), "BTC");
        assert_eq!(normalize_symbol("BTCUSDT"), "BTC");
        assert_eq!(normalize_symbol(" eth "), "ETH");
        assert_eq!(normalize_symbol("link_usd"), "LINK");
    }

    #[test]
    fn normalize_keeps_bare_quote_symbols() {
        // "USD" alone is not a pair suffix to strip.
        assert_eq!(normalize_symbol("USD"), "USD");
    }

    #[test]
    fn registry_lists_builtin_pairs() {
        let registry = FeedRegistry::from_env();
        assert_eq!(registry.all().len(), 5);
        assert!(registry.all().iter().all(|f| f.decimals == 8));

        let btc = registry.resolve("btc/usd").expect("BTC registered");
        assert_eq!(btc.pair, "BTC/USD");
        assert_eq!(btc.binance_symbol, "BTCUSDT");
    }

    #[test]
    fn registry_rejects_unknown_symbols() {
        let registry = FeedRegistry::from_env();
        assert!(registry.resolve("DOGE").is_none());
        assert!(registry.resolve("").is_none());
    }
}
