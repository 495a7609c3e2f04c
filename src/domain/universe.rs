//! Ticker universe for batch comparisons.
//!
//! Parses ticker lists from configuration and records tickers that were
//! dropped from a batch, with the reason.

use std::collections::HashSet;
use std::fmt;

use crate::domain::error::StratbenchError;

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),
}

/// Split a comma-separated list into uppercase tickers, preserving order.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTicker {
    pub ticker: String,
    pub reason: SkipReason,
}

impl SkippedTicker {
    /// Classify a per-ticker failure. An empty series is `NoData`; anything
    /// else the provider raised is kept as its message.
    pub fn from_error(ticker: &str, err: StratbenchError) -> Self {
        let reason = match err {
            StratbenchError::DataUnavailable { .. } => SkipReason::NoData,
            other => SkipReason::ProviderError(other.to_string()),
        };
        SkippedTicker {
            ticker: ticker.to_string(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Empty series for the requested range.
    NoData,
    /// The provider failed; the message is kept for reporting.
    ProviderError(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData => write!(f, "no data in range"),
            SkipReason::ProviderError(msg) => write!(f, "{msg}"),
        }
    }
}
