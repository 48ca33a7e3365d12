//! Price quote source port trait.

use crate::domain::error::TraderError;
use crate::domain::registry::QuoteMap;

/// Source of current USD quotes keyed by external symbol.
pub trait PriceQuoteGateway {
    /// Fetch quotes for `symbols`.
    ///
    /// Symbols the source does not know are simply absent from the map.
    /// Only a failure of the whole request is an `Err`, normally
    /// `TraderError::TransportFailure`.
    fn fetch_quotes(&self, symbols: &[&str]) -> Result<QuoteMap, TraderError>;
}
