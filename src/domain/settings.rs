//! Runtime settings read from the INI config and validated up front.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::error::TraderError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_STARTING_BALANCE: f64 = 10_000.0;
pub const DEFAULT_STATE_FILE: &str = "portfolio.json";
pub const DEFAULT_TIMEOUT_SECS: i64 = 10;
pub const DEFAULT_MIN_REFRESH_INTERVAL_SECS: i64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSettings {
    /// Overrides the public/pro host picked from the API key.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub min_refresh_interval: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub starting_balance: f64,
    pub state_file: PathBuf,
    pub quotes: QuoteSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            starting_balance: DEFAULT_STARTING_BALANCE,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            quotes: QuoteSettings {
                base_url: None,
                api_key: None,
                timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS as u64),
                min_refresh_interval: Duration::from_secs(
                    DEFAULT_MIN_REFRESH_INTERVAL_SECS as u64,
                ),
            },
        }
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

impl Settings {
    /// Read `[portfolio]` and `[quotes]`, falling back to defaults for
    /// absent keys.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TraderError> {
        let starting_balance =
            config.get_double("portfolio", "starting_balance", DEFAULT_STARTING_BALANCE);
        validate_starting_balance(starting_balance)?;

        let state_file = match config.get_string("portfolio", "state_file") {
            Some(v) if v.trim().is_empty() => {
                return Err(invalid("portfolio", "state_file", "state_file must not be empty"));
            }
            Some(v) => PathBuf::from(v.trim()),
            None => PathBuf::from(DEFAULT_STATE_FILE),
        };

        let timeout_secs = config.get_int("quotes", "timeout_secs", DEFAULT_TIMEOUT_SECS);
        if timeout_secs <= 0 {
            return Err(invalid("quotes", "timeout_secs", "timeout_secs must be positive"));
        }

        let interval_secs = config.get_int(
            "quotes",
            "min_refresh_interval_secs",
            DEFAULT_MIN_REFRESH_INTERVAL_SECS,
        );
        if interval_secs < 0 {
            return Err(invalid(
                "quotes",
                "min_refresh_interval_secs",
                "min_refresh_interval_secs must be non-negative",
            ));
        }

        Ok(Settings {
            starting_balance,
            state_file,
            quotes: QuoteSettings {
                base_url: config
                    .get_non_empty("quotes", "base_url")
                    .map(|u| u.trim_end_matches('/').to_string()),
                api_key: config.get_non_empty("quotes", "api_key"),
                timeout: Duration::from_secs(timeout_secs as u64),
                min_refresh_interval: Duration::from_secs(interval_secs as u64),
            },
        })
    }
}

/// Also used for the `--balance` command-line override.
pub fn validate_starting_balance(value: f64) -> Result<(), TraderError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            "portfolio",
            "starting_balance",
            "starting_balance must be a non-negative number",
        ));
    }
    Ok(())
}
