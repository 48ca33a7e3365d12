//! Concrete adapter implementations for ports.

#[cfg(feature = "coingecko")]
pub mod coingecko_adapter;
pub mod file_config_adapter;
pub mod json_state_adapter;
