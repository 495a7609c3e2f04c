//! SQLite price store.
//!
//! One table keyed by (ticker, date); dates are stored as `YYYY-MM-DD` text
//! so lexical order is chronological order.

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::collections::BTreeSet;
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> StratbenchError {
    StratbenchError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> StratbenchError {
    StratbenchError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_stored_date(value: &str) -> Result<NaiveDate, StratbenchError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| StratbenchError::Database {
        reason: format!("bad stored date {value:?}: {e}"),
    })
}

impl SqliteAdapter {
    /// Opens the database named by `[data] sqlite_path` and ensures the
    /// schema exists.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StratbenchError> {
        let db_path =
            config
                .get_string("data", "sqlite_path")
                .ok_or_else(|| StratbenchError::ConfigMissing {
                    section: "data".into(),
                    key: "sqlite_path".into(),
                })?;

        let pool_size = config.get_int("data", "pool_size", 4).clamp(1, 64) as u32;
        let adapter = Self::open(&db_path, pool_size)?;
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn open<P: AsRef<Path>>(path: P, pool_size: u32) -> Result<Self, StratbenchError> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        tracing::debug!(path = %path.as_ref().display(), pool_size, "opened sqlite store");
        Ok(Self { pool })
    }

    /// Each in-memory connection is its own database, so the pool holds one.
    pub fn in_memory() -> Result<Self, StratbenchError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StratbenchError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), StratbenchError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS ohlcv (
                    ticker TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume INTEGER NOT NULL,
                    PRIMARY KEY (ticker, date)
                );
                CREATE INDEX IF NOT EXISTS idx_ohlcv_date ON ohlcv(date);",
            )
            .map_err(query_error)
    }

    /// Upsert: a bar replaces any stored bar with the same (ticker, date).
    pub fn insert_bars(&self, bars: &[PriceBar]) -> Result<usize, StratbenchError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR REPLACE INTO ohlcv (ticker, date, open, high, low, close, volume)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(query_error)?;

            for bar in bars {
                stmt.execute(params![
                    bar.ticker,
                    bar.date.format(DATE_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ])
                .map_err(query_error)?;
            }
        }

        tx.commit().map_err(query_error)?;
        tracing::info!(rows = bars.len(), "stored price bars");
        Ok(bars.len())
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StratbenchError> {
        let conn = self.conn()?;

        let query = "SELECT ticker, date, open, high, low, close, volume
                     FROM ohlcv
                     WHERE ticker = ?1 AND date >= ?2 AND date <= ?3
                     ORDER BY date ASC";

        let mut stmt = conn.prepare(query).map_err(query_error)?;

        let rows = stmt
            .query_map(
                params![
                    ticker,
                    start_date.format(DATE_FORMAT).to_string(),
                    end_date.format(DATE_FORMAT).to_string()
                ],
                |row| {
                    let date_str: String = row.get(1)?;
                    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            1,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                    Ok(PriceBar {
                        ticker: row.get(0)?,
                        date,
                        open: row.get(2)?,
                        high: row.get(3)?,
                        low: row.get(4)?,
                        close: row.get(5)?,
                        volume: row.get(6)?,
                    })
                },
            )
            .map_err(query_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(query_error)
    }

    fn list_tickers(&self) -> Result<BTreeSet<String>, StratbenchError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT ticker FROM ohlcv")
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(query_error)?;

        rows.collect::<Result<BTreeSet<_>, _>>().map_err(query_error)
    }

    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StratbenchError> {
        let conn = self.conn()?;

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM ohlcv WHERE ticker = ?1",
                params![ticker],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_error)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => Ok(Some((
                parse_stored_date(&min_str)?,
                parse_stored_date(&max_str)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}
