//! Domain error types.

/// Top-level error type for cointrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("unknown asset: {name}")]
    UnknownAsset { name: String },

    #[error("insufficient balance: need {required:.2}, have {available:.2}")]
    InsufficientBalance { required: f64, available: f64 },

    #[error("invalid quantity {requested} for {asset}: {reason}")]
    InvalidQuantity {
        asset: String,
        requested: f64,
        reason: String,
    },

    #[error("missing quote for {asset} ({symbol})")]
    MissingQuote { asset: String, symbol: String },

    #[error("quote type error for {asset}: {reason}")]
    QuoteTypeError { asset: String, reason: String },

    #[error("price refresh failed: {reason}")]
    TransportFailure { reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed state document: {reason}")]
    Parse { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },
}

impl TraderError {
    /// True for the per-asset refresh failures that never abort a refresh.
    pub fn is_per_asset_quote_error(&self) -> bool {
        matches!(
            self,
            TraderError::MissingQuote { .. } | TraderError::QuoteTypeError { .. }
        )
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        // Only startup errors end the process; everything else is reported
        // by the menu, so any non-config failure is a plain 1.
        let code: u8 = match err {
            TraderError::ConfigParse { .. } | TraderError::ConfigInvalid { .. } => 2,
            _ => 1,
        };
        std::process::ExitCode::from(code)
    }
}
