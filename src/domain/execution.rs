//! Bar-by-bar execution of a signal series.
//!
//! Two states: out of the market (`shares == 0`) where only `Buy` acts, and
//! in the market where only `Sell` acts. Each bar is processed using nothing
//! but that bar's close and its own signal. Any open position is closed at
//! the final close, so every run ends fully in cash.

use chrono::NaiveDate;
use std::fmt;

use super::ohlcv::PriceBar;
use super::portfolio::{OrderOutcome, Portfolio};
use super::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
    /// Liquidation of a position still open after the last bar.
    SellForced,
}

impl TradeAction {
    pub fn is_exit(&self) -> bool {
        matches!(self, TradeAction::Sell | TradeAction::SellForced)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
            TradeAction::SellForced => write!(f, "SELL_FORCED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub shares: u64,
}

/// Output of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub trades: Vec<Trade>,
    /// Mark-to-market value at each bar's close.
    pub value_series: Vec<f64>,
    pub final_cash: f64,
    /// Shares left open because the final exit was rejected. Zero on valid data.
    pub open_shares: u64,
}

/// Execute `signals` against `bars`, starting from `starting_cash`.
///
/// `signals` is expected to be one per bar; any bar past the end of
/// `signals` is treated as `Hold`.
pub fn simulate(bars: &[PriceBar], signals: &[Signal], starting_cash: f64) -> Simulation {
    let mut portfolio = Portfolio::new(starting_cash);
    let mut trades = Vec::new();
    let mut value_series = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let signal = signals.get(i).copied().unwrap_or(Signal::Hold);

        match signal {
            Signal::Buy if !portfolio.is_in_market() => {
                record(&mut trades, bar, TradeAction::Buy, portfolio.buy(bar.close));
            }
            Signal::Sell if portfolio.is_in_market() => {
                record(&mut trades, bar, TradeAction::Sell, portfolio.sell(bar.close));
            }
            _ => {}
        }

        value_series.push(portfolio.total_value(bar.close));
    }

    if let Some(last) = bars.last().filter(|_| portfolio.is_in_market()) {
        tracing::debug!(
            date = %last.date,
            price = last.close,
            "closing open position at end of series"
        );
        let outcome = portfolio.sell(last.close);
        if !matches!(outcome, OrderOutcome::Filled { .. }) {
            tracing::warn!(
                date = %last.date,
                price = last.close,
                shares = portfolio.shares,
                "forced exit did not fill; position left open"
            );
        }
        record(&mut trades, last, TradeAction::SellForced, outcome);
    }

    Simulation {
        trades,
        value_series,
        final_cash: portfolio.cash,
        open_shares: portfolio.shares,
    }
}

fn record(trades: &mut Vec<Trade>, bar: &PriceBar, action: TradeAction, outcome: OrderOutcome) {
    if let OrderOutcome::Filled { quantity, price } = outcome {
        trades.push(Trade {
            date: bar.date,
            action,
            price,
            shares: quantity,
        });
    }
}
