//! Cash balance and holdings.

use std::collections::BTreeMap;

use super::error::TraderError;

/// Cash plus per-asset quantities.
///
/// Only the engine (and a successful load) change a portfolio, so the
/// mutators are crate-private. Every stored quantity is > 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    cash_balance: f64,
    holdings: BTreeMap<String, f64>,
}

impl Portfolio {
    pub fn new(starting_balance: f64) -> Self {
        Portfolio {
            cash_balance: starting_balance,
            holdings: BTreeMap::new(),
        }
    }

    /// Build a portfolio from stored values, checking the holdings invariant.
    pub fn restore(
        cash_balance: f64,
        holdings: BTreeMap<String, f64>,
    ) -> Result<Self, TraderError> {
        if !cash_balance.is_finite() || cash_balance < 0.0 {
            return Err(TraderError::Parse {
                reason: format!("balance {cash_balance} must be a non-negative number"),
            });
        }
        if let Some((name, qty)) = holdings
            .iter()
            .find(|(_, q)| !q.is_finite() || **q <= 0.0)
        {
            return Err(TraderError::Parse {
                reason: format!("holding {name} has non-positive quantity {qty}"),
            });
        }
        Ok(Portfolio {
            cash_balance,
            holdings,
        })
    }

    pub fn cash_balance(&self) -> f64 {
        self.cash_balance
    }

    pub fn holdings(&self) -> &BTreeMap<String, f64> {
        &self.holdings
    }

    /// Held quantity, 0.0 when the asset is not held.
    pub fn holding(&self, name: &str) -> f64 {
        self.holdings.get(name).copied().unwrap_or(0.0)
    }

    pub fn has_holding(&self, name: &str) -> bool {
        self.holdings.contains_key(name)
    }

    pub(crate) fn debit(&mut self, amount: f64, name: &str, quantity: f64) {
        self.cash_balance -= amount;
        *self.holdings.entry(name.to_string()).or_insert(0.0) += quantity;
    }

    pub(crate) fn credit(&mut self, amount: f64, name: &str, quantity: f64) {
        self.cash_balance += amount;
        let remaining = self.holding(name) - quantity;
        if remaining == 0.0 {
            self.holdings.remove(name);
        } else {
            self.holdings.insert(name.to_string(), remaining);
        }
    }
}
