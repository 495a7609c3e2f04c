//! Performance metrics over a completed run.
//!
//! All values are percentages. Every statistic is a pure reduction over
//! the value series and trade log produced by the simulator.

use super::execution::Trade;
use super::ohlcv::PriceBar;
use super::strategy::StrategyConfig;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsResult {
    pub ticker: String,
    pub strategy: StrategyConfig,
    pub total_return_pct: f64,
    pub annual_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub num_trades: usize,
    pub win_rate_pct: f64,
    pub portfolio_value_series: Vec<f64>,
}

impl MetricsResult {
    /// `final_cash` is the cash balance after forced liquidation, which is
    /// also the last point of `value_series`.
    pub fn compute(
        strategy: StrategyConfig,
        bars: &[PriceBar],
        value_series: Vec<f64>,
        trades: &[Trade],
        starting_cash: f64,
        final_cash: f64,
    ) -> Self {
        let ticker = bars.first().map(|b| b.ticker.clone()).unwrap_or_default();
        let total_return_pct = total_return_pct(final_cash, starting_cash);

        MetricsResult {
            ticker,
            strategy,
            total_return_pct,
            annual_return_pct: annual_return_pct(total_return_pct, bars.len()),
            max_drawdown_pct: max_drawdown_pct(&value_series),
            num_trades: trades.len(),
            win_rate_pct: win_rate_pct(trades),
            portfolio_value_series: value_series,
        }
    }
}

pub fn total_return_pct(final_cash: f64, starting_cash: f64) -> f64 {
    if starting_cash > 0.0 {
        (final_cash - starting_cash) / starting_cash * 100.0
    } else {
        0.0
    }
}

/// Compound `total_return_pct` over `num_bars` trading days to a yearly rate.
/// A wipeout (≤ -100%) reports -100 rather than a fractional power of a
/// non-positive base.
pub fn annual_return_pct(total_return_pct: f64, num_bars: usize) -> f64 {
    if total_return_pct <= -100.0 {
        return -100.0;
    }
    if num_bars == 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return_pct / 100.0;
    (growth.powf(TRADING_DAYS_PER_YEAR / num_bars as f64) - 1.0) * 100.0
}

/// Most negative percentage decline from the running peak; 0 or below.
/// A zero peak contributes a drawdown of 0.
pub fn max_drawdown_pct(value_series: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &value in value_series {
        peak = peak.max(value);
        let drawdown = if peak == 0.0 {
            0.0
        } else {
            (value - peak) / peak * 100.0
        };
        max_dd = max_dd.min(drawdown);
    }

    max_dd
}

/// Trades are paired (entry, exit) in log order; a pair wins when the exit
/// price beats the entry price. An unpaired trailing trade is ignored.
pub fn win_rate_pct(trades: &[Trade]) -> f64 {
    let pairs = trades.len() / 2;
    if pairs == 0 {
        return 0.0;
    }

    let wins = trades
        .chunks_exact(2)
        .filter(|pair| pair[1].price > pair[0].price)
        .count();

    wins as f64 / pairs as f64 * 100.0
}
