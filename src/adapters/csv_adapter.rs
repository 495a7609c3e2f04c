//! CSV file data adapter.
//!
//! A directory of `<TICKER>.csv` files with a header row naming the columns
//! `date, open, high, low, close, volume` in any order and any case. Extra
//! columns (adjusted close, dividends) are ignored.

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StratbenchError> {
        let dir = config
            .get_string("data", "csv_dir")
            .ok_or_else(|| StratbenchError::ConfigMissing {
                section: "data".into(),
                key: "csv_dir".into(),
            })?;
        Ok(Self::new(PathBuf::from(dir)))
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    /// Full history for `ticker`, sorted by date. A missing file is no data.
    fn load(&self, ticker: &str) -> Result<Vec<PriceBar>, StratbenchError> {
        let path = self.csv_path(ticker);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no csv file for ticker");
            return Ok(Vec::new());
        }
        let mut bars = read_csv_file(&path, ticker)?;
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

/// Parse one CSV file into bars for `ticker`, in file order.
pub fn read_csv_file(path: &Path, ticker: &str) -> Result<Vec<PriceBar>, StratbenchError> {
    let source_name = path.display().to_string();
    let csv_error = |reason: String| StratbenchError::CsvParse {
        source_name: source_name.clone(),
        reason,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(e.to_string()))?;

    let headers = rdr.headers().map_err(|e| csv_error(e.to_string()))?.clone();
    let mut index = [0usize; 6];
    for (slot, name) in index.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| csv_error(format!("missing {} column", name)))?;
    }

    let mut bars = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| csv_error(e.to_string()))?;
        let field = |column: usize| {
            record
                .get(index[column])
                .ok_or_else(|| csv_error(format!("row {}: missing {}", line + 1, COLUMNS[column])))
        };
        let number = |column: usize| -> Result<f64, StratbenchError> {
            field(column)?.parse::<f64>().map_err(|e| {
                csv_error(format!("row {}: invalid {} value: {}", line + 1, COLUMNS[column], e))
            })
        };

        // Exports that carry a time component keep the date in the first ten characters.
        let date_field = field(0)?;
        let date_str = date_field.get(..10).unwrap_or(date_field);
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| csv_error(format!("row {}: invalid date: {}", line + 1, e)))?;

        let volume_field = field(5)?;
        let volume = match volume_field.parse::<i64>() {
            Ok(v) => v,
            Err(_) => number(5)?.round() as i64,
        };

        bars.push(PriceBar {
            ticker: ticker.to_string(),
            date,
            open: number(1)?,
            high: number(2)?,
            low: number(3)?,
            close: number(4)?,
            volume,
        });
    }

    Ok(bars)
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StratbenchError> {
        let mut bars = self.load(ticker)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<BTreeSet<String>, StratbenchError> {
        let entries = fs::read_dir(&self.base_path)?;

        let mut tickers = BTreeSet::new();
        for entry in entries {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if let Some(stem) = path.file_stem().filter(|_| is_csv) {
                tickers.insert(stem.to_string_lossy().to_string());
            }
        }

        Ok(tickers)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StratbenchError> {
        let bars = self.load(ticker)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n";

        fs::write(path.join("NVDA.csv"), csv_content).unwrap();
        fs::write(path.join("AAPL.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "not price data").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_ohlcv_returns_sorted_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        let bars = adapter.fetch_ohlcv("NVDA", start, end).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].ticker, "NVDA");
        assert_eq!(bars[0].date, start);
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[2].date, end);
    }

    #[test]
    fn fetch_ohlcv_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let day = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let bars = adapter.fetch_ohlcv("NVDA", day, day).unwrap();

        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, day);
    }

    #[test]
    fn fetch_ohlcv_missing_file_is_empty() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(adapter.fetch_ohlcv("XYZ", start, end).unwrap().is_empty());
    }

    #[test]
    fn list_tickers_only_csv_files() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let tickers: Vec<_> = adapter.list_tickers().unwrap().into_iter().collect();
        assert_eq!(tickers, vec!["AAPL", "NVDA"]);
    }

    #[test]
    fn data_range_spans_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(
            adapter.get_data_range("NVDA").unwrap(),
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 17).unwrap(),
                3
            ))
        );
        assert_eq!(adapter.get_data_range("AAPL").unwrap(), None);
    }

    #[test]
    fn read_csv_file_accepts_capitalised_headers_and_extra_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.csv");
        fs::write(
            &path,
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2024-03-01 00:00:00,10.0,11.0,9.5,10.5,10.4,1200.0\n",
        )
        .unwrap();

        let bars = read_csv_file(&path, "SPY").unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(bars[0].close, 10.5);
        assert_eq!(bars[0].volume, 1200);
    }

    #[test]
    fn read_csv_file_reports_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "date,open,high,low,close\n2024-01-01,1,1,1,1\n").unwrap();

        let err = read_csv_file(&path, "BAD").unwrap_err();
        assert!(matches!(err, StratbenchError::CsvParse { reason, .. } if reason.contains("volume")));
    }

    #[test]
    fn read_csv_file_reports_bad_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(
            &path,
            "date,open,high,low,close,volume\n2024-01-01,1,1,1,oops,5\n",
        )
        .unwrap();

        let err = read_csv_file(&path, "BAD").unwrap_err();
        assert!(matches!(err, StratbenchError::CsvParse { reason, .. }
            if reason.contains("row 1") && reason.contains("close")));
    }
}
