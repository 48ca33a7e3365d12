//! Tradable assets and the fixed name -> external symbol table.

/// Symbol returned for names outside the catalog.
pub const UNKNOWN_SYMBOL: &str = "";

/// The closed catalog, in display order: (name, external quote symbol).
pub const CATALOG: [(&str, &str); 8] = [
    ("Bitcoin", "bitcoin"),
    ("Ethereum", "ethereum"),
    ("Tether", "tether"),
    ("Solana", "solana"),
    ("BNB", "binancecoin"),
    ("XRP", "ripple"),
    ("Cardano", "cardano"),
    ("Dogecoin", "dogecoin"),
];

/// Map an asset name to the symbol the quote source uses.
///
/// Total over all input: names outside [`CATALOG`] get [`UNKNOWN_SYMBOL`]
/// rather than an error. Matching is exact.
pub fn resolve_external_symbol(name: &str) -> &'static str {
    CATALOG
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, symbol)| *symbol)
        .unwrap_or(UNKNOWN_SYMBOL)
}

/// One raw price entry from a quote map.
#[derive(Debug, Clone, PartialEq)]
pub enum Quote {
    Price(f64),
    /// The source had an entry for the symbol but no usable number.
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub name: String,
    pub external_symbol: &'static str,
    pub current_price: f64,
    pub price_history: Vec<f64>,
}

impl Asset {
    pub fn new(name: &str) -> Self {
        Asset {
            name: name.to_string(),
            external_symbol: resolve_external_symbol(name),
            current_price: 0.0,
            price_history: Vec::new(),
        }
    }

    /// An asset counts as priced once any refresh (or load) gave it a sample.
    pub fn is_priced(&self) -> bool {
        !self.price_history.is_empty()
    }

    pub(crate) fn record_price(&mut self, price: f64) {
        self.current_price = price;
        self.price_history.push(price);
    }
}
