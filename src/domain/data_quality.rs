//! Data-quality checks over stored price history.
//!
//! A report lists every issue found; an empty issue list means the series is
//! usable. Checks never modify or drop bars.

use std::fmt;

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;

/// Roughly eight years of trading days.
pub const DEFAULT_MIN_ROWS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataIssue {
    LowRowCount { rows: usize, expected_min: usize },
    NegativePrice { column: &'static str, rows: usize },
    HighBelowLow { rows: usize },
    ZeroVolume { rows: usize },
    /// Bars dated on or before their predecessor.
    OutOfOrder { rows: usize },
}

impl fmt::Display for DataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIssue::LowRowCount { rows, expected_min } => {
                write!(f, "low row count: {rows} (expected at least {expected_min})")
            }
            DataIssue::NegativePrice { column, rows } => {
                write!(f, "negative values in {column}: {rows} rows")
            }
            DataIssue::HighBelowLow { rows } => write!(f, "high < low in {rows} rows"),
            DataIssue::ZeroVolume { rows } => write!(f, "zero volume days: {rows}"),
            DataIssue::OutOfOrder { rows } => write!(f, "out-of-order or duplicate dates: {rows} rows"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataQualityReport {
    pub ticker: String,
    pub total_rows: usize,
    pub issues: Vec<DataIssue>,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSummary {
    pub total_tickers: usize,
    pub problem_tickers: Vec<DataQualityReport>,
}

pub fn validate_series(ticker: &str, bars: &[PriceBar], min_rows: usize) -> DataQualityReport {
    let mut issues = Vec::new();

    if bars.len() < min_rows {
        issues.push(DataIssue::LowRowCount {
            rows: bars.len(),
            expected_min: min_rows,
        });
    }

    for (position, column) in ["open", "high", "low", "close"].into_iter().enumerate() {
        let rows = bars
            .iter()
            .filter(|b| b.price_columns()[position].1 < 0.0)
            .count();
        if rows > 0 {
            issues.push(DataIssue::NegativePrice { column, rows });
        }
    }

    let high_below_low = bars.iter().filter(|b| b.high < b.low).count();
    if high_below_low > 0 {
        issues.push(DataIssue::HighBelowLow {
            rows: high_below_low,
        });
    }

    let zero_volume = bars.iter().filter(|b| b.volume == 0).count();
    if zero_volume > 0 {
        issues.push(DataIssue::ZeroVolume { rows: zero_volume });
    }

    let out_of_order = bars.windows(2).filter(|w| w[1].date <= w[0].date).count();
    if out_of_order > 0 {
        issues.push(DataIssue::OutOfOrder { rows: out_of_order });
    }

    DataQualityReport {
        ticker: ticker.to_string(),
        total_rows: bars.len(),
        issues,
    }
}

/// Validate the full stored history of `ticker`.
pub fn validate_ticker(
    data_port: &dyn DataPort,
    ticker: &str,
    min_rows: usize,
) -> Result<DataQualityReport, StratbenchError> {
    let bars = match data_port.get_data_range(ticker)? {
        Some((first, last, _)) => data_port.fetch_ohlcv(ticker, first, last)?,
        None => Vec::new(),
    };
    Ok(validate_series(ticker, &bars, min_rows))
}

pub fn validate_universe_data(
    data_port: &dyn DataPort,
    tickers: &[String],
    min_rows: usize,
) -> Result<ValidationSummary, StratbenchError> {
    tracing::info!(tickers = tickers.len(), "validating stored data");

    let mut problem_tickers = Vec::new();
    for ticker in tickers {
        let report = validate_ticker(data_port, ticker, min_rows)?;
        if !report.is_clean() {
            tracing::debug!(ticker = %ticker, issues = report.issues.len(), "data issues found");
            problem_tickers.push(report);
        }
    }

    Ok(ValidationSummary {
        total_tickers: tickers.len(),
        problem_tickers,
    })
}
