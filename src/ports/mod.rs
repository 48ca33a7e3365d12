//! Port traits at the I/O boundaries of the domain.

pub mod config_port;
pub mod quote_port;
pub mod state_port;
