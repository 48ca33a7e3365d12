//! cointrader — paper-trading simulator for a fixed set of cryptocurrencies.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], the interactive front end in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
