//! Trade execution, valuation and price refresh.
//!
//! These are the only functions that change a [`Portfolio`]'s cash or
//! holdings. Each one validates completely before touching state, so a
//! returned error always means nothing changed.

use tracing::{info, warn};

use super::error::TraderError;
use super::portfolio::Portfolio;
use super::registry::{AssetRegistry, RefreshReport};
use crate::ports::quote_port::PriceQuoteGateway;

/// Smallest quantity a sell accepts, unless it closes the whole position.
pub const MIN_SELL_UNITS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// What an executed trade did.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeReceipt {
    pub side: Side,
    pub asset: String,
    pub quantity: f64,
    pub price: f64,
    /// Cash paid (buy) or received (sell).
    pub amount: f64,
    pub balance_after: f64,
}

/// One holding valued at the current price.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionValue {
    pub asset: String,
    pub quantity: f64,
    pub price: f64,
    pub market_value: f64,
}

fn invalid_quantity(asset: &str, requested: f64, reason: impl Into<String>) -> TraderError {
    TraderError::InvalidQuantity {
        asset: asset.to_string(),
        requested,
        reason: reason.into(),
    }
}

/// Current tradable price of `asset`.
///
/// Fails for names outside the registry and for assets no refresh has
/// priced yet.
fn quoted_price(registry: &AssetRegistry, asset: &str) -> Result<f64, TraderError> {
    let entry = registry.get(asset).ok_or_else(|| TraderError::UnknownAsset {
        name: asset.to_string(),
    })?;
    if !entry.is_priced() {
        return Err(TraderError::MissingQuote {
            asset: asset.to_string(),
            symbol: entry.external_symbol.to_string(),
        });
    }
    Ok(entry.current_price)
}

/// Buy `quantity` of `asset` at its current price.
///
/// 1. Reject non-finite or non-positive quantities
/// 2. Look up the quoted price (asset must be known and priced)
/// 3. Reject if cost exceeds cash
/// 4. Debit cash and credit the holding together
pub fn buy(
    portfolio: &mut Portfolio,
    registry: &AssetRegistry,
    asset: &str,
    quantity: f64,
) -> Result<TradeReceipt, TraderError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(invalid_quantity(asset, quantity, "quantity must be positive"));
    }
    let price = quoted_price(registry, asset)?;

    let cost = quantity * price;
    if cost > portfolio.cash_balance() {
        return Err(TraderError::InsufficientBalance {
            required: cost,
            available: portfolio.cash_balance(),
        });
    }

    portfolio.debit(cost, asset, quantity);
    info!(asset, quantity, price, cost, "bought");

    Ok(TradeReceipt {
        side: Side::Buy,
        asset: asset.to_string(),
        quantity,
        price,
        amount: cost,
        balance_after: portfolio.cash_balance(),
    })
}

/// Sell `quantity` of `asset` at its current price.
///
/// Quantities below [`MIN_SELL_UNITS`] are refused unless they close the
/// position exactly. A holding that reaches exactly zero is removed.
pub fn sell(
    portfolio: &mut Portfolio,
    registry: &AssetRegistry,
    asset: &str,
    quantity: f64,
) -> Result<TradeReceipt, TraderError> {
    let price = quoted_price(registry, asset)?;

    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(invalid_quantity(asset, quantity, "quantity must be positive"));
    }
    let held = portfolio.holding(asset);
    if !portfolio.has_holding(asset) {
        return Err(invalid_quantity(asset, quantity, "asset is not held"));
    }
    if quantity > held {
        return Err(invalid_quantity(
            asset,
            quantity,
            format!("exceeds held amount {held}"),
        ));
    }
    if quantity < MIN_SELL_UNITS && quantity != held {
        return Err(invalid_quantity(
            asset,
            quantity,
            format!("below minimum sell unit of {MIN_SELL_UNITS}"),
        ));
    }

    let proceeds = quantity * price;
    portfolio.credit(proceeds, asset, quantity);
    info!(asset, quantity, price, proceeds, "sold");

    Ok(TradeReceipt {
        side: Side::Sell,
        asset: asset.to_string(),
        quantity,
        price,
        amount: proceeds,
        balance_after: portfolio.cash_balance(),
    })
}

/// Every holding valued at the current price, in name order.
///
/// Holdings for names the registry does not know are valued at zero.
pub fn position_values(portfolio: &Portfolio, registry: &AssetRegistry) -> Vec<PositionValue> {
    portfolio
        .holdings()
        .iter()
        .map(|(name, &quantity)| {
            let price = registry.find_price(name).unwrap_or(0.0);
            PositionValue {
                asset: name.clone(),
                quantity,
                price,
                market_value: quantity * price,
            }
        })
        .collect()
}

/// Cash plus the market value of every holding.
pub fn valuation(portfolio: &Portfolio, registry: &AssetRegistry) -> f64 {
    let holdings_value: f64 = position_values(portfolio, registry)
        .iter()
        .map(|p| p.market_value)
        .sum();
    portfolio.cash_balance() + holdings_value
}

/// Fetch fresh quotes for the whole catalog and apply them.
///
/// A gateway failure leaves every price as it was and comes back as
/// `TransportFailure`. Per-asset problems are inside the returned report.
pub fn refresh_prices(
    registry: &mut AssetRegistry,
    gateway: &dyn PriceQuoteGateway,
) -> Result<RefreshReport, TraderError> {
    let symbols = registry.symbols();
    let quotes = gateway.fetch_quotes(&symbols).map_err(|e| {
        warn!(error = %e, "quote fetch failed, keeping previous prices");
        match e {
            TraderError::TransportFailure { .. } => e,
            other => TraderError::TransportFailure {
                reason: other.to_string(),
            },
        }
    })?;

    let report = registry.refresh_all(&quotes);
    info!(
        updated = report.updated.len(),
        failed = report.failures.len(),
        "prices refreshed"
    );
    Ok(report)
}
