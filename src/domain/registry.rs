//! Fixed, ordered catalog of tradable assets with their prices.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::asset::{Asset, Quote, CATALOG};
use super::error::TraderError;

/// External symbol -> raw quote.
pub type QuoteMap = HashMap<String, Quote>;

/// Outcome of applying one quote map to the registry.
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub updated: Vec<String>,
    pub failures: Vec<TraderError>,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetRegistry {
    assets: Vec<Asset>,
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetRegistry {
    /// Registry holding the full catalog, unpriced.
    pub fn new() -> Self {
        AssetRegistry {
            assets: CATALOG.iter().map(|(name, _)| Asset::new(name)).collect(),
        }
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut Asset> {
        self.assets.iter_mut().find(|a| a.name == name)
    }

    /// Catalog name matching `input` case-insensitively.
    pub fn canonical_name(&self, input: &str) -> Option<&str> {
        let input = input.trim();
        self.assets
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(input))
            .map(|a| a.name.as_str())
    }

    /// External symbols of every asset, in catalog order.
    pub fn symbols(&self) -> Vec<&'static str> {
        self.assets.iter().map(|a| a.external_symbol).collect()
    }

    pub fn find_price(&self, name: &str) -> Option<f64> {
        self.get(name).map(|a| a.current_price)
    }

    /// Apply one quote to the named asset, returning the accepted price.
    pub fn apply_quote(&mut self, name: &str, quote: &Quote) -> Result<f64, TraderError> {
        let asset = self
            .get_mut(name)
            .ok_or_else(|| TraderError::UnknownAsset {
                name: name.to_string(),
            })?;

        let price = match quote {
            Quote::Price(p) if p.is_finite() && *p >= 0.0 => *p,
            Quote::Price(p) => {
                return Err(TraderError::QuoteTypeError {
                    asset: name.to_string(),
                    reason: format!("price {p} is not a non-negative number"),
                });
            }
            Quote::Malformed(raw) => {
                return Err(TraderError::QuoteTypeError {
                    asset: name.to_string(),
                    reason: format!("expected a number, got {raw}"),
                });
            }
        };

        asset.record_price(price);
        Ok(price)
    }

    /// Apply a quote map to every catalog asset.
    ///
    /// Missing or malformed quotes are collected in the report and leave
    /// that asset untouched; they never stop the other assets updating.
    pub fn refresh_all(&mut self, quotes: &QuoteMap) -> RefreshReport {
        let mut report = RefreshReport::default();
        let targets: Vec<(String, &'static str)> = self
            .assets
            .iter()
            .map(|a| (a.name.clone(), a.external_symbol))
            .collect();

        for (name, symbol) in targets {
            let Some(quote) = quotes.get(symbol) else {
                warn!(asset = %name, symbol, "no quote in response");
                report.failures.push(TraderError::MissingQuote {
                    asset: name,
                    symbol: symbol.to_string(),
                });
                continue;
            };
            match self.apply_quote(&name, quote) {
                Ok(price) => {
                    debug!(asset = %name, price, "price updated");
                    report.updated.push(name);
                }
                Err(e) => {
                    warn!(asset = %name, error = %e, "quote rejected");
                    report.failures.push(e);
                }
            }
        }

        report
    }

    /// Replace an asset's history wholesale; false if the name is unknown.
    ///
    /// The current price follows the last loaded sample; an empty history
    /// leaves the asset unpriced at 0.
    pub(crate) fn replace_history(&mut self, name: &str, history: Vec<f64>) -> bool {
        let Some(asset) = self.get_mut(name) else {
            return false;
        };
        asset.current_price = history.last().copied().unwrap_or(0.0);
        asset.price_history = history;
        true
    }
}
