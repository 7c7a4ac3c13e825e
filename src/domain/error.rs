//! Domain error types.

/// Top-level error type for gekko-signals.
///
/// Duplicate signal detection is deliberately absent: re-recording an
/// existing (symbol, timeframe, date) key resolves to the stored row via
/// [`crate::ports::signal_port::Recorded::Existing`].
#[derive(Debug, thiserror::Error)]
pub enum GekkoError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid price data for {symbol}: {reason}")]
    Validation { symbol: String, reason: String },

    #[error("not found: {symbol} ({detail})")]
    NotFound { symbol: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GekkoError {
    pub fn validation(symbol: &str, reason: impl Into<String>) -> Self {
        GekkoError::Validation {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this error's category.
    pub fn exit_code(&self) -> u8 {
        match self {
            GekkoError::Io(_) => 1,
            GekkoError::ConfigParse { .. }
            | GekkoError::ConfigMissing { .. }
            | GekkoError::ConfigInvalid { .. } => 2,
            GekkoError::Database { .. } | GekkoError::DatabaseQuery { .. } => 3,
            GekkoError::Validation { .. } => 4,
            GekkoError::NotFound { .. } => 5,
        }
    }
}

impl From<&GekkoError> for std::process::ExitCode {
    fn from(err: &GekkoError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}
