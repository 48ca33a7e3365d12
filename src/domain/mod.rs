//! Core domain types and logic.

pub mod asset;
pub mod registry;
pub mod portfolio;
pub mod engine;
pub mod settings;
pub mod error;
