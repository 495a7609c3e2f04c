//! Price-history provider port.

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;
use std::collections::BTreeSet;

pub trait DataPort {
    /// Bars for `ticker` with `start_date <= date <= end_date`, ascending by
    /// date. An empty vector means no data, never zero-valued bars.
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StratbenchError>;

    fn list_tickers(&self) -> Result<BTreeSet<String>, StratbenchError>;

    /// (first date, last date, bar count) of the stored history.
    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StratbenchError>;
}
