//! Strategy configuration and signal generation.
//!
//! `StrategyConfig` is a closed set: each variant carries every parameter
//! needed to reproduce its signal series from a price series.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::StratbenchError;
use crate::domain::indicator::{self, macd};
use crate::domain::ohlcv::{PriceBar, closes};
use crate::domain::signal::{Signal, crossed_above, crossed_below, scan_pairs};

pub const DEFAULT_SMA_WINDOW: usize = 20;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_RSI_OVERSOLD: f64 = 30.0;
pub const DEFAULT_RSI_OVERBOUGHT: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrategyConfig {
    BuyAndHold,
    Sma {
        window: usize,
    },
    Rsi {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl StrategyConfig {
    pub fn sma_default() -> Self {
        StrategyConfig::Sma {
            window: DEFAULT_SMA_WINDOW,
        }
    }

    pub fn rsi_default() -> Self {
        StrategyConfig::Rsi {
            period: DEFAULT_RSI_PERIOD,
            oversold: DEFAULT_RSI_OVERSOLD,
            overbought: DEFAULT_RSI_OVERBOUGHT,
        }
    }

    pub fn macd_default() -> Self {
        StrategyConfig::Macd {
            fast: macd::DEFAULT_FAST,
            slow: macd::DEFAULT_SLOW,
            signal: macd::DEFAULT_SIGNAL,
        }
    }

    /// The standard comparison set, in presentation order.
    pub fn defaults() -> Vec<StrategyConfig> {
        vec![
            StrategyConfig::BuyAndHold,
            StrategyConfig::sma_default(),
            StrategyConfig::rsi_default(),
            StrategyConfig::macd_default(),
        ]
    }

    /// Stable identifier, as used in config files.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::BuyAndHold => "buy_and_hold",
            StrategyConfig::Sma { .. } => "simple_moving_average",
            StrategyConfig::Rsi { .. } => "rsi",
            StrategyConfig::Macd { .. } => "macd",
        }
    }

    /// Fewest bars for which the strategy can emit anything but `Hold`.
    pub fn min_lookback(&self) -> usize {
        match *self {
            StrategyConfig::BuyAndHold => 2,
            StrategyConfig::Sma { window } => window,
            StrategyConfig::Rsi { period, .. } => period,
            StrategyConfig::Macd { slow, signal, .. } => slow + signal,
        }
    }

    pub fn validate(&self) -> Result<(), StratbenchError> {
        let invalid = |reason: &str| StratbenchError::InvalidStrategy {
            strategy: self.to_string(),
            reason: reason.to_string(),
        };

        match *self {
            StrategyConfig::BuyAndHold => Ok(()),
            StrategyConfig::Sma { window } => {
                if window == 0 {
                    return Err(invalid("window must be at least 1"));
                }
                Ok(())
            }
            StrategyConfig::Rsi {
                period,
                oversold,
                overbought,
            } => {
                if period == 0 {
                    return Err(invalid("period must be at least 1"));
                }
                if !(0.0..=100.0).contains(&oversold) || !(0.0..=100.0).contains(&overbought) {
                    return Err(invalid("thresholds must be between 0 and 100"));
                }
                if oversold >= overbought {
                    return Err(invalid("oversold must be below overbought"));
                }
                Ok(())
            }
            StrategyConfig::Macd { fast, slow, signal } => {
                if fast == 0 || signal == 0 {
                    return Err(invalid("spans must be at least 1"));
                }
                if fast >= slow {
                    return Err(invalid("fast span must be shorter than slow span"));
                }
                Ok(())
            }
        }
    }

    /// One signal per bar. Pure: the same bars always give the same signals.
    ///
    /// A series shorter than [`min_lookback`](Self::min_lookback), or an
    /// invalid parameter set, yields all `Hold` so the run completes flat.
    pub fn generate(&self, bars: &[PriceBar]) -> Vec<Signal> {
        let n = bars.len();

        if let Err(e) = self.validate() {
            tracing::warn!("{e}; emitting no signals");
            return vec![Signal::Hold; n];
        }
        if n < self.min_lookback() {
            tracing::debug!(
                strategy = %self,
                bars = n,
                minimum = self.min_lookback(),
                "insufficient data, emitting no signals"
            );
            return vec![Signal::Hold; n];
        }

        let closes = closes(bars);
        match *self {
            StrategyConfig::BuyAndHold => buy_and_hold_signals(n),
            StrategyConfig::Sma { window } => sma_signals(&closes, window),
            StrategyConfig::Rsi {
                period,
                oversold,
                overbought,
            } => rsi_signals(&closes, period, oversold, overbought),
            StrategyConfig::Macd { fast, slow, signal } => {
                macd_signals(&closes, fast, slow, signal)
            }
        }
    }
}

fn buy_and_hold_signals(n: usize) -> Vec<Signal> {
    let mut signals = vec![Signal::Hold; n];
    signals[0] = Signal::Buy;
    signals[n - 1] = Signal::Sell;
    signals
}

fn sma_signals(closes: &[f64], window: usize) -> Vec<Signal> {
    let averages = indicator::sma(closes, window);
    let points: Vec<Option<(f64, f64)>> = closes
        .iter()
        .zip(&averages)
        .map(|(&price, avg)| avg.map(|avg| (price, avg)))
        .collect();

    scan_pairs(&points, window, |prev, current| match (prev, current) {
        (Some((prev_price, prev_sma)), Some((price, sma)))
            if crossed_above(prev_price, prev_sma, price, sma) =>
        {
            Signal::Buy
        }
        (Some((prev_price, prev_sma)), Some((price, sma)))
            if crossed_below(prev_price, prev_sma, price, sma) =>
        {
            Signal::Sell
        }
        _ => Signal::Hold,
    })
}

fn rsi_signals(closes: &[f64], period: usize, oversold: f64, overbought: f64) -> Vec<Signal> {
    let values = indicator::rsi(closes, period);

    scan_pairs(&values, period, |prev, current| match (prev, current) {
        (Some(prev), Some(rsi)) if crossed_below(prev, oversold, rsi, oversold) => Signal::Buy,
        (Some(prev), Some(rsi)) if crossed_above(prev, overbought, rsi, overbought) => {
            Signal::Sell
        }
        _ => Signal::Hold,
    })
}

fn macd_signals(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<Signal> {
    let points = indicator::macd(closes, fast, slow, signal);

    scan_pairs(&points, slow + signal, |prev, current| {
        if crossed_above(prev.line, prev.signal, current.line, current.signal) {
            Signal::Buy
        } else if crossed_below(prev.line, prev.signal, current.line, current.signal) {
            Signal::Sell
        } else {
            Signal::Hold
        }
    })
}

impl fmt::Display for StrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyConfig::BuyAndHold => write!(f, "BuyAndHold"),
            StrategyConfig::Sma { window } => write!(f, "SMA({})", window),
            StrategyConfig::Rsi {
                period,
                oversold,
                overbought,
            } => write!(f, "RSI({},{},{})", period, oversold, overbought),
            StrategyConfig::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}

/// Parses a strategy name into its default parameter set.
impl FromStr for StrategyConfig {
    type Err = StratbenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "buy_and_hold" | "buyandhold" | "bh" => Ok(StrategyConfig::BuyAndHold),
            "simple_moving_average" | "sma" => Ok(StrategyConfig::sma_default()),
            "rsi" => Ok(StrategyConfig::rsi_default()),
            "macd" => Ok(StrategyConfig::macd_default()),
            _ => Err(StratbenchError::UnknownStrategy {
                name: s.trim().to_string(),
            }),
        }
    }
}
