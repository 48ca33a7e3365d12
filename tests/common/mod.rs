#![allow(dead_code)]

use cointrader::domain::asset::Quote;
use cointrader::domain::error::TraderError;
use cointrader::domain::registry::{AssetRegistry, QuoteMap};
use cointrader::domain::settings::Settings;
use cointrader::ports::quote_port::PriceQuoteGateway;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Gateway returning a canned quote map, or a canned transport failure.
pub struct MockQuoteGateway {
    pub quotes: QuoteMap,
    pub failure: Option<String>,
    pub requests: Rc<RefCell<Vec<Vec<String>>>>,
}

impl MockQuoteGateway {
    pub fn new() -> Self {
        Self {
            quotes: QuoteMap::new(),
            failure: None,
            requests: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.quotes.insert(symbol.to_string(), Quote::Price(price));
        self
    }

    pub fn with_malformed(mut self, symbol: &str, raw: &str) -> Self {
        self.quotes
            .insert(symbol.to_string(), Quote::Malformed(raw.to_string()));
        self
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    /// Handle for inspecting requests after the gateway is boxed.
    pub fn request_log(&self) -> Rc<RefCell<Vec<Vec<String>>>> {
        Rc::clone(&self.requests)
    }
}

impl PriceQuoteGateway for MockQuoteGateway {
    fn fetch_quotes(&self, symbols: &[&str]) -> Result<QuoteMap, TraderError> {
        self.requests
            .borrow_mut()
            .push(symbols.iter().map(|s| s.to_string()).collect());
        if let Some(reason) = &self.failure {
            return Err(TraderError::TransportFailure {
                reason: reason.clone(),
            });
        }
        Ok(self.quotes.clone())
    }
}

/// Quotes for the whole catalog.
pub fn full_market() -> MockQuoteGateway {
    MockQuoteGateway::new()
        .with_price("bitcoin", 67000.5)
        .with_price("ethereum", 3200.1)
        .with_price("tether", 1.0)
        .with_price("solana", 150.25)
        .with_price("binancecoin", 600.0)
        .with_price("ripple", 0.52)
        .with_price("cardano", 0.45)
        .with_price("dogecoin", 0.12)
}

pub fn priced_registry(entries: &[(&str, f64)]) -> AssetRegistry {
    let mut registry = AssetRegistry::new();
    for (name, price) in entries {
        registry.apply_quote(name, &Quote::Price(*price)).unwrap();
    }
    registry
}

/// Default settings with the refresh throttle disabled.
pub fn test_settings(starting_balance: f64) -> Settings {
    let mut settings = Settings::default();
    settings.starting_balance = starting_balance;
    settings.quotes.min_refresh_interval = Duration::ZERO;
    settings
}
