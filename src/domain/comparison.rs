//! Strategy comparison across one or many tickers.
//!
//! A ticker's series is fetched once and shared read-only by every strategy
//! run. Runs own all of their state, so they execute in parallel on the rayon
//! pool; results come back in the order the strategies were given.

use rayon::prelude::*;

use crate::domain::backtest::{BacktestConfig, RunOutput, fetch_series, run_strategy};
use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::strategy::StrategyConfig;
use crate::domain::universe::SkippedTicker;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq)]
pub struct TickerComparison {
    pub ticker: String,
    pub bars: usize,
    pub runs: Vec<RunOutput>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchComparison {
    pub comparisons: Vec<TickerComparison>,
    pub skipped: Vec<SkippedTicker>,
}

/// Run every strategy over the same in-memory series.
pub fn run_all(bars: &[PriceBar], strategies: &[StrategyConfig], starting_cash: f64) -> Vec<RunOutput> {
    strategies
        .par_iter()
        .map(|&strategy| run_strategy(bars, strategy, starting_cash))
        .collect()
}

pub fn compare_strategies(
    data_port: &dyn DataPort,
    ticker: &str,
    config: &BacktestConfig,
    strategies: &[StrategyConfig],
) -> Result<TickerComparison, StratbenchError> {
    let bars = fetch_series(data_port, ticker, config)?;
    tracing::info!(
        ticker,
        bars = bars.len(),
        strategies = strategies.len(),
        "comparing strategies"
    );

    Ok(TickerComparison {
        ticker: ticker.to_string(),
        bars: bars.len(),
        runs: run_all(&bars, strategies, config.starting_cash),
    })
}

/// Compare strategies for each ticker. A ticker whose data cannot be loaded
/// is skipped and reported; it never aborts the rest of the batch.
pub fn compare_tickers(
    data_port: &dyn DataPort,
    tickers: &[String],
    config: &BacktestConfig,
    strategies: &[StrategyConfig],
) -> BatchComparison {
    let mut batch = BatchComparison::default();

    for ticker in tickers {
        match compare_strategies(data_port, ticker, config, strategies) {
            Ok(comparison) => batch.comparisons.push(comparison),
            Err(e) => {
                tracing::warn!(ticker = %ticker, "skipping ticker: {e}");
                batch.skipped.push(SkippedTicker::from_error(ticker, e));
            }
        }
    }

    if !batch.skipped.is_empty() {
        tracing::info!(
            compared = batch.comparisons.len(),
            total = tickers.len(),
            "batch finished with skipped tickers"
        );
    }

    batch
}
