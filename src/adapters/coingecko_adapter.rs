//! CoinGecko quote gateway.
//!
//! Calls `GET /simple/price?ids=...&vs_currencies=usd`, which answers with
//! `{"bitcoin": {"usd": 67000.5}, ...}`.
//! - Public API: no key, roughly 10-30 calls/minute
//! - Demo API: free key prefixed `CG-`
//! - Pro API: paid key, separate host

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use crate::domain::asset::Quote;
use crate::domain::error::TraderError;
use crate::domain::registry::QuoteMap;
use crate::domain::settings::QuoteSettings;
use crate::ports::quote_port::PriceQuoteGateway;

const PUBLIC_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PRO_BASE_URL: &str = "https://pro-api.coingecko.com/api/v3";
const VS_CURRENCY: &str = "usd";

fn default_base_url(api_key: Option<&str>) -> &'static str {
    match api_key {
        Some(key) if !key.starts_with("CG-") => PRO_BASE_URL,
        _ => PUBLIC_BASE_URL,
    }
}

fn transport(reason: impl std::fmt::Display) -> TraderError {
    TraderError::TransportFailure {
        reason: reason.to_string(),
    }
}

pub struct CoinGeckoAdapter {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoAdapter {
    pub fn new(settings: &QuoteSettings) -> Result<Self, TraderError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(transport)?;
        let base_url = settings
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(settings.api_key.as_deref()).to_string());
        Ok(Self {
            client,
            base_url,
            api_key: settings.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl PriceQuoteGateway for CoinGeckoAdapter {
    fn fetch_quotes(&self, symbols: &[&str]) -> Result<QuoteMap, TraderError> {
        let url = format!("{}/simple/price", self.base_url);
        let ids = symbols.join(",");
        debug!(%url, %ids, "requesting quotes");

        let mut request = self
            .client
            .get(&url)
            .query(&[("ids", ids.as_str()), ("vs_currencies", VS_CURRENCY)])
            .header("Accept", "application/json");

        if let Some(key) = &self.api_key {
            if key.starts_with("CG-") {
                request = request.header("x-cg-demo-api-key", key);
            } else {
                request = request.header("x-cg-pro-api-key", key);
            }
        }

        let response = request.send().map_err(transport)?;
        let status = response.status();
        let body = response.text().map_err(transport)?;
        if !status.is_success() {
            return Err(transport(format!("CoinGecko API error: {status} - {body}")));
        }

        parse_simple_price(&body, symbols)
    }
}

/// Turn a `simple/price` body into a quote map for `symbols`.
///
/// Requested symbols absent from the body stay absent. A symbol whose entry
/// has no numeric `usd` field becomes [`Quote::Malformed`]. A body that is
/// not a JSON object fails the whole fetch.
pub fn parse_simple_price(body: &str, symbols: &[&str]) -> Result<QuoteMap, TraderError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| transport(format!("invalid quote response: {e}")))?;
    let Value::Object(entries) = value else {
        return Err(transport("quote response is not a JSON object"));
    };

    let mut quotes = QuoteMap::new();
    for &symbol in symbols {
        let Some(entry) = entries.get(symbol) else {
            continue;
        };
        let quote = match entry.get(VS_CURRENCY) {
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Quote::Price)
                .unwrap_or_else(|| Quote::Malformed(n.to_string())),
            Some(other) => Quote::Malformed(other.to_string()),
            None => Quote::Malformed(entry.to_string()),
        };
        quotes.insert(symbol.to_string(), quote);
    }
    Ok(quotes)
}
