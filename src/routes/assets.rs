//! Templated site assets: the embeddable price widget, crawler files, and
//! the Open Graph card for a round.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::feeds::FeedInfo;
use crate::state::AppState;
use crate::types::RoundData;

/// GET /embed.js — drop-in widget that polls the latest round for a pair.
pub async fn embed_js(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        render_embed(&state.config.public_base_url),
    )
}

pub fn render_embed(base_url: &str) -> String {
    format!(
        r#"(function () {{
  var BASE = "{base_url}";
  function mount(el) {{
    var symbol = el.getAttribute("data-symbol") || "BTC";
    function refresh() {{
      fetch(BASE + "/api/get-latest-round?symbol=" + encodeURIComponent(symbol))
        .then(function (res) {{ return res.json(); }})
        .then(function (round) {{
          el.textContent = symbol + "/USD " + (Number(round.median) / 1e8).toFixed(2);
        }})
        .catch(function () {{ el.textContent = symbol + "/USD --"; }});
    }}
    refresh();
    setInterval(refresh, 30000);
  }}
  var nodes = document.querySelectorAll("[data-rion-feed]");
  for (var i = 0; i < nodes.length; i++) mount(nodes[i]);
}})();
"#
    )
}

/// GET /robots.txt
pub async fn robots(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain")],
        render_robots(&state.config.public_base_url),
    )
}

pub fn render_robots(base_url: &str) -> String {
    format!("User-agent: *\nAllow: /\n\nSitemap: {base_url}/sitemap.xml\n")
}

/// GET /sitemap.xml — site pages plus one entry per registered feed.
pub async fn sitemap(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    (
        [(header::CONTENT_TYPE, "application/xml")],
        render_sitemap(&state.config.public_base_url, state.feeds.all(), &today),
    )
}

pub fn render_sitemap(base_url: &str, feeds: &[FeedInfo], today: &str) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
"#,
    );

    for page in ["", "/feeds", "/dashboard", "/docs"] {
        out.push_str(&format!(
            "  <url><loc>{base_url}{page}</loc><lastmod>{today}</lastmod></url>\n"
        ));
    }
    for feed in feeds {
        out.push_str(&format!(
            "  <url><loc>{base_url}/feeds/{}</loc><lastmod>{today}</lastmod></url>\n",
            feed.symbol.to_lowercase()
        ));
    }

    out.push_str("</urlset>\n");
    out
}

#[derive(Debug, Deserialize)]
pub struct OgQuery {
    pub feed: Option<String>,
}

/// GET /api/og/round/:id — SVG share card for a round. Falls back to the
/// feed's cached latest round, then to a placeholder; share cards never 500.
pub async fn og_round(
    State(state): State<Arc<AppState>>,
    Path(round_id): Path<String>,
    Query(query): Query<OgQuery>,
) -> impl IntoResponse {
    let feed = query.feed.unwrap_or_else(|| "BTC".to_string());
    let symbol = crate::feeds::normalize_symbol(&feed);
    let decimals = state.feeds.resolve(&symbol).map(|f| f.decimals).unwrap_or(8);

    let round = match state.cache.get_round(&symbol, &round_id).await {
        Ok(Some(round)) => Some(round),
        _ => state.cache.latest_round(&symbol).await.ok().flatten(),
    };

    (
        [(header::CONTENT_TYPE, "image/svg+xml")],
        render_og_card(&symbol, round.as_ref(), decimals),
    )
}

pub fn render_og_card(symbol: &str, round: Option<&RoundData>, decimals: u8) -> String {
    let (median_display, round_line) = match round {
        Some(round) => (
            format_median(&round.median, decimals),
            format!("Round #{} · {} councils", round.round_id, round.councils.len()),
        ),
        None => ("--".to_string(), "No round data".to_string()),
    };

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="1200" height="630" viewBox="0 0 1200 630">
  <rect width="1200" height="630" fill="#0b0e14"/>
  <text x="80" y="140" font-family="monospace" font-size="36" fill="#7f8ea3">RION ORACLE NETWORK</text>
  <text x="80" y="300" font-family="monospace" font-size="96" fill="#ffffff">{symbol}/USD</text>
  <text x="80" y="420" font-family="monospace" font-size="72" fill="#4ade80">${median_display}</text>
  <text x="80" y="520" font-family="monospace" font-size="32" fill="#7f8ea3">{round_line}</text>
</svg>
"##
    )
}

fn format_median(median: &str, decimals: u8) -> String {
    median
        .parse::<i128>()
        .ok()
        .and_then(|raw| Decimal::try_from_i128_with_scale(raw, decimals as u32).ok())
        .map(|d| d.to_string())
        .unwrap_or_else(|| "--".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_references_the_base_url() {
        let js = render_embed("https://rion.network");
        assert!(js.contains("https://rion.network"));
        assert!(js.contains("/api/get-latest-round?symbol="));
    }

    #[test]
    fn robots_links_the_sitemap() {
        let txt = render_robots("https://rion.network");
        assert!(txt.starts_with("User-agent: *"));
        assert!(txt.contains("https://rion.network/sitemap.xml"));
    }

    #[test]
    fn sitemap_lists_feeds() {
        let feeds = vec![FeedInfo {
            symbol: "BTC".into(),
            pair: "BTC/USD".into(),
            binance_symbol: "BTCUSDT".into(),
            decimals: 8,
            aggregator: None,
        }];
        let xml = render_sitemap("https://rion.network", &feeds, "2026-08-07");
        assert!(xml.contains("<loc>https://rion.network/feeds/btc</loc>"));
        assert!(xml.contains("<lastmod>2026-08-07</lastmod>"));
        assert!(xml.ends_with("</urlset>\n"));
    }

    #[test]
    fn og_card_formats_the_median() {
        let round = RoundData {
            feed: "BTC".into(),
            round_id: "42".into(),
            median: "6500012345678".into(),
            timestamp: 0,
            councils: vec!["a".into(), "b".into(), "c".into()],
            tx_hash: None,
        };
        let svg = render_og_card("BTC", Some(&round), 8);
        assert!(svg.contains("BTC/USD"));
        assert!(svg.contains("$65000.12345678"));
        assert!(svg.contains("Round #42"));
        assert!(svg.contains("3 councils"));

        let empty = render_og_card("ETH", None, 8);
        assert!(empty.contains("No round data"));
    }
}
