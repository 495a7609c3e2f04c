//! Domain error types.
//!
//! Only failures that abort a run live here. Insufficient lookback, guarded
//! divisions and rejected orders are resolved inside the run that hit them.

/// Top-level error type for stratbench.
#[derive(Debug, thiserror::Error)]
pub enum StratbenchError {
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

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("invalid strategy {strategy}: {reason}")]
    InvalidStrategy { strategy: String, reason: String },

    #[error("no price data for {ticker}")]
    DataUnavailable { ticker: String },

    #[error("CSV error in {source_name}: {reason}")]
    CsvParse { source_name: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StratbenchError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        StratbenchError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&StratbenchError> for std::process::ExitCode {
    fn from(err: &StratbenchError) -> Self {
        let code: u8 = match err {
            StratbenchError::Io(_) | StratbenchError::CsvParse { .. } => 1,
            StratbenchError::ConfigParse { .. }
            | StratbenchError::ConfigMissing { .. }
            | StratbenchError::ConfigInvalid { .. } => 2,
            StratbenchError::Database { .. } | StratbenchError::DatabaseQuery { .. } => 3,
            StratbenchError::UnknownStrategy { .. } | StratbenchError::InvalidStrategy { .. } => 4,
            StratbenchError::DataUnavailable { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
