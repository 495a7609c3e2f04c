//! Single (ticker, strategy) backtest pipeline.
//!
//! signals -> simulation -> metrics, each stage completing before the next.
//! `BacktestConfig` carries the run parameters shared by every strategy.

use chrono::NaiveDate;

use crate::domain::error::StratbenchError;
use crate::domain::execution::{Simulation, Trade, simulate};
use crate::domain::metrics::MetricsResult;
use crate::domain::ohlcv::PriceBar;
use crate::domain::strategy::StrategyConfig;
use crate::ports::data_port::DataPort;

pub const DEFAULT_STARTING_CASH: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub starting_cash: f64,
}

/// Detailed record of one run, for trade-level reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub ticker: String,
    pub strategy: StrategyConfig,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub starting_cash: f64,
    pub ending_cash: f64,
    pub total_return_pct: f64,
    pub num_trades: usize,
    pub trade_log: Vec<Trade>,
}

/// Both views of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub result: BacktestResult,
    pub metrics: MetricsResult,
}

/// Run one strategy over an already-loaded, non-empty series.
pub fn run_strategy(bars: &[PriceBar], strategy: StrategyConfig, starting_cash: f64) -> RunOutput {
    let signals = strategy.generate(bars);
    let Simulation {
        trades,
        value_series,
        final_cash,
        ..
    } = simulate(bars, &signals, starting_cash);

    let metrics = MetricsResult::compute(
        strategy,
        bars,
        value_series,
        &trades,
        starting_cash,
        final_cash,
    );

    tracing::debug!(
        strategy = %strategy,
        trades = trades.len(),
        total_return_pct = metrics.total_return_pct,
        "run complete"
    );

    let result = BacktestResult {
        ticker: metrics.ticker.clone(),
        strategy,
        start_date: bars.first().map_or(NaiveDate::MIN, |b| b.date),
        end_date: bars.last().map_or(NaiveDate::MIN, |b| b.date),
        starting_cash,
        ending_cash: final_cash,
        total_return_pct: metrics.total_return_pct,
        num_trades: trades.len(),
        trade_log: trades,
    };

    RunOutput { result, metrics }
}

/// Fetch `ticker` for the configured range and run `strategy` over it.
pub fn backtest_ticker(
    data_port: &dyn DataPort,
    ticker: &str,
    strategy: StrategyConfig,
    config: &BacktestConfig,
) -> Result<RunOutput, StratbenchError> {
    let bars = fetch_series(data_port, ticker, config)?;
    Ok(run_strategy(&bars, strategy, config.starting_cash))
}

/// Load a series, treating an empty result as unavailable data.
pub fn fetch_series(
    data_port: &dyn DataPort,
    ticker: &str,
    config: &BacktestConfig,
) -> Result<Vec<PriceBar>, StratbenchError> {
    let bars = data_port.fetch_ohlcv(ticker, config.start_date, config.end_date)?;
    if bars.is_empty() {
        return Err(StratbenchError::DataUnavailable {
            ticker: ticker.to_string(),
        });
    }
    Ok(bars)
}
