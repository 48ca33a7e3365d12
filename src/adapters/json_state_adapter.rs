//! JSON file persistence for the portfolio and price histories.
//!
//! Document layout:
//!
//! ```json
//! {
//!   "portfolio": { "balance": 10000.0, "holdings": { "Bitcoin": 0.5 } },
//!   "Cryptos": { "Bitcoin": { "historicalPrices": [67000.5] } }
//! }
//! ```
//!
//! Loading is all-or-nothing: the whole document is decoded and validated
//! before the in-memory portfolio or registry is touched. `Cryptos` entries
//! outside the catalog are never inspected, only reported as ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::asset::{resolve_external_symbol, UNKNOWN_SYMBOL};
use crate::domain::error::TraderError;
use crate::domain::portfolio::Portfolio;
use crate::domain::registry::AssetRegistry;
use crate::ports::state_port::{LoadReport, StatePort};

/// Written with typed [`CryptoRecord`]s, read with raw values so unknown
/// entries can be skipped without parsing them.
#[derive(Debug, Serialize, Deserialize)]
struct StateDocument<C> {
    portfolio: PortfolioRecord,
    #[serde(rename = "Cryptos", default = "BTreeMap::new")]
    cryptos: BTreeMap<String, C>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PortfolioRecord {
    balance: f64,
    holdings: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CryptoRecord {
    #[serde(rename = "historicalPrices")]
    historical_prices: Vec<f64>,
}

/// A decoded, validated document not yet applied to live state.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedState {
    pub portfolio: Portfolio,
    pub histories: BTreeMap<String, Vec<f64>>,
    /// `Cryptos` names outside the catalog, sorted by name.
    pub ignored: Vec<String>,
}

/// Render the portfolio and every catalog asset's history as pretty JSON.
pub fn encode(portfolio: &Portfolio, registry: &AssetRegistry) -> Result<String, TraderError> {
    let document = StateDocument {
        portfolio: PortfolioRecord {
            balance: portfolio.cash_balance(),
            holdings: portfolio.holdings().clone(),
        },
        cryptos: registry
            .assets()
            .iter()
            .map(|a| {
                (
                    a.name.clone(),
                    CryptoRecord {
                        historical_prices: a.price_history.clone(),
                    },
                )
            })
            .collect(),
    };
    serde_json::to_string_pretty(&document).map_err(|e| TraderError::Parse {
        reason: format!("failed to encode state: {e}"),
    })
}

/// Parse and validate a document.
pub fn decode(text: &str) -> Result<DecodedState, TraderError> {
    let document: StateDocument<Value> =
        serde_json::from_str(text).map_err(|e| TraderError::Parse {
            reason: e.to_string(),
        })?;

    let portfolio = Portfolio::restore(document.portfolio.balance, document.portfolio.holdings)?;

    let mut histories = BTreeMap::new();
    let mut ignored = Vec::new();
    for (name, raw) in document.cryptos {
        if resolve_external_symbol(&name) == UNKNOWN_SYMBOL {
            ignored.push(name);
            continue;
        }
        let record: CryptoRecord = serde_json::from_value(raw).map_err(|e| TraderError::Parse {
            reason: format!("{name}: {e}"),
        })?;
        if let Some(bad) = record
            .historical_prices
            .iter()
            .find(|p| !p.is_finite() || **p < 0.0)
        {
            return Err(TraderError::Parse {
                reason: format!("{name} has invalid historical price {bad}"),
            });
        }
        histories.insert(name, record.historical_prices);
    }

    Ok(DecodedState {
        portfolio,
        histories,
        ignored,
    })
}

/// Swap decoded state into the live portfolio and registry.
///
/// Names the registry does not know are skipped; registry assets missing
/// from the document keep their current history.
pub fn apply(
    decoded: DecodedState,
    portfolio: &mut Portfolio,
    registry: &mut AssetRegistry,
) -> LoadReport {
    let mut report = LoadReport::default();
    for name in decoded.ignored {
        warn!(asset = %name, "ignoring unknown asset in state file");
        report.ignored.push(name);
    }
    for (name, history) in decoded.histories {
        if registry.replace_history(&name, history) {
            report.restored.push(name);
        } else {
            warn!(asset = %name, "ignoring unknown asset in state file");
            report.ignored.push(name);
        }
    }
    *portfolio = decoded.portfolio;
    report
}

fn io_error(path: &Path, source: std::io::Error) -> TraderError {
    TraderError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub fn save(path: &Path, portfolio: &Portfolio, registry: &AssetRegistry) -> Result<(), TraderError> {
    let text = encode(portfolio, registry)?;
    fs::write(path, text).map_err(|e| io_error(path, e))?;
    info!(path = %path.display(), "state saved");
    Ok(())
}

pub fn load(
    path: &Path,
    portfolio: &mut Portfolio,
    registry: &mut AssetRegistry,
) -> Result<LoadReport, TraderError> {
    let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let decoded = decode(&text)?;
    let report = apply(decoded, portfolio, registry);
    debug!(
        restored = report.restored.len(),
        ignored = report.ignored.len(),
        "histories restored"
    );
    info!(path = %path.display(), "state loaded");
    Ok(report)
}

/// [`StatePort`] bound to a single file.
pub struct JsonStateAdapter {
    path: PathBuf,
}

impl JsonStateAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StatePort for JsonStateAdapter {
    fn save(&self, portfolio: &Portfolio, registry: &AssetRegistry) -> Result<(), TraderError> {
        save(&self.path, portfolio, registry)
    }

    fn load(
        &self,
        portfolio: &mut Portfolio,
        registry: &mut AssetRegistry,
    ) -> Result<LoadReport, TraderError> {
        load(&self.path, portfolio, registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::Quote;
    use crate::domain::engine;

    const SAMPLE: &str = r#"{
  "portfolio": {
    "balance": 10000.0,
    "holdings": { "Bitcoin": 0.5, "XRP": 120.0 }
  },
  "Cryptos": {
    "Bitcoin": { "historicalPrices": [67000.5, 67100.2] },
    "Ethereum": { "historicalPrices": [] }
  }
}"#;

    #[test]
    fn decode_sample_document() {
        let decoded = decode(SAMPLE).unwrap();
        assert_eq!(decoded.portfolio.cash_balance(), 10000.0);
        assert_eq!(decoded.portfolio.holding("XRP"), 120.0);
        assert_eq!(decoded.histories["Bitcoin"], vec![67000.5, 67100.2]);
        assert!(decoded.histories["Ethereum"].is_empty());
    }

    #[test]
    fn encode_uses_wire_field_names() {
        let mut registry = AssetRegistry::new();
        registry.apply_quote("Bitcoin", &Quote::Price(100.0)).unwrap();
        let mut portfolio = Portfolio::new(1000.0);
        engine::buy(&mut portfolio, &registry, "Bitcoin", 2.0).unwrap();

        let text = encode(&portfolio, &registry).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["portfolio"]["balance"], 800.0);
        assert_eq!(value["portfolio"]["holdings"]["Bitcoin"], 2.0);
        assert_eq!(
            value["Cryptos"]["Bitcoin"]["historicalPrices"],
            serde_json::json!([100.0])
        );
        assert_eq!(value["Cryptos"].as_object().unwrap().len(), 8);
        assert!(text.contains('\n'));
    }

    #[test]
    fn decode_without_cryptos_section() {
        let decoded =
            decode(r#"{"portfolio": {"balance": 5.0, "holdings": {}}}"#).unwrap();
        assert!(decoded.histories.is_empty());
    }

    #[test]
    fn decode_rejects_missing_balance() {
        let err = decode(r#"{"portfolio": {"holdings": {}}, "Cryptos": {}}"#).unwrap_err();
        assert!(matches!(err, TraderError::Parse { .. }));
    }

    #[test]
    fn decode_rejects_non_numeric_holding() {
        let err = decode(r#"{"portfolio": {"balance": 1.0, "holdings": {"XRP": "ten"}}}"#)
            .unwrap_err();
        assert!(matches!(err, TraderError::Parse { .. }));
    }

    #[test]
    fn decode_rejects_zero_holding() {
        let err = decode(r#"{"portfolio": {"balance": 1.0, "holdings": {"XRP": 0.0}}}"#)
            .unwrap_err();
        assert!(matches!(err, TraderError::Parse { .. }));
    }

    #[test]
    fn decode_rejects_negative_history_sample() {
        let text = r#"{"portfolio": {"balance": 1.0, "holdings": {}},
                       "Cryptos": {"XRP": {"historicalPrices": [0.5, -0.1]}}}"#;
        assert!(matches!(decode(text), Err(TraderError::Parse { .. })));
    }

    #[test]
    fn decode_skips_unknown_entries_unread() {
        let text = r#"{"portfolio": {"balance": 1.0, "holdings": {}},
                       "Cryptos": {"Polkadot": {},
                                   "Monero": {"historicalPrices": [-1.0]},
                                   "Litecoin": "junk",
                                   "XRP": {"historicalPrices": [0.5]}}}"#;
        let decoded = decode(text).unwrap();
        assert_eq!(decoded.histories.len(), 1);
        assert_eq!(decoded.histories["XRP"], vec![0.5]);
        assert_eq!(decoded.ignored, vec!["Litecoin", "Monero", "Polkadot"]);
    }

    #[test]
    fn decode_requires_history_for_catalog_entries() {
        let text = r#"{"portfolio": {"balance": 1.0, "holdings": {}},
                       "Cryptos": {"Bitcoin": {}}}"#;
        let err = decode(text).unwrap_err();
        assert!(matches!(err, TraderError::Parse { ref reason } if reason.starts_with("Bitcoin")));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode("not json"), Err(TraderError::Parse { .. })));
    }

    #[test]
    fn apply_ignores_unknown_and_keeps_absent() {
        let mut registry = AssetRegistry::new();
        registry.apply_quote("Solana", &Quote::Price(150.0)).unwrap();
        let mut portfolio = Portfolio::new(1.0);

        let text = r#"{"portfolio": {"balance": 42.0, "holdings": {"Bitcoin": 1.0}},
                       "Cryptos": {"Bitcoin": {"historicalPrices": [1.0, 2.0]},
                                   "Polkadot": {"historicalPrices": [7.0]}}}"#;
        let report = apply(decode(text).unwrap(), &mut portfolio, &mut registry);

        assert_eq!(report.restored, vec!["Bitcoin".to_string()]);
        assert_eq!(report.ignored, vec!["Polkadot".to_string()]);
        assert!(registry.get("Polkadot").is_none());
        assert_eq!(registry.assets().len(), 8);
        assert_eq!(registry.get("Solana").unwrap().price_history, vec![150.0]);
        assert_eq!(registry.find_price("Bitcoin"), Some(2.0));
        assert_eq!(portfolio.cash_balance(), 42.0);
        assert_eq!(portfolio.holding("Bitcoin"), 1.0);
    }
}
