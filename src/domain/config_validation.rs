//! Configuration validation.
//!
//! Validates all config fields before a run and builds the strategy list
//! from the `[backtest]`, `[sma]`, `[rsi]` and `[macd]` sections.

use crate::domain::backtest::DEFAULT_STARTING_CASH;
use crate::domain::data_quality::DEFAULT_MIN_ROWS;
use crate::domain::error::StratbenchError;
use crate::domain::indicator::macd;
use crate::domain::strategy::{
    DEFAULT_RSI_OVERBOUGHT, DEFAULT_RSI_OVERSOLD, DEFAULT_RSI_PERIOD, DEFAULT_SMA_WINDOW,
    StrategyConfig,
};
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), StratbenchError> {
    starting_cash(config)?;
    validate_dates(config)?;
    tickers(config)?;
    build_strategies(config)?;
    min_rows(config)?;
    Ok(())
}

pub fn starting_cash(config: &dyn ConfigPort) -> Result<f64, StratbenchError> {
    let value = config.get_double("backtest", "starting_cash", DEFAULT_STARTING_CASH);
    if !value.is_finite() || value <= 0.0 {
        return Err(StratbenchError::config_invalid(
            "backtest",
            "starting_cash",
            "starting_cash must be positive",
        ));
    }
    Ok(value)
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), StratbenchError> {
    let start = config_date(config, "start_date")?;
    let end = config_date(config, "end_date")?;
    check_date_order(start, end)
}

/// Optional `[backtest]` date; absent means "use the stored range".
pub fn config_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, StratbenchError> {
    match config.get_string("backtest", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_date(&s, key).map(Some),
    }
}

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate, StratbenchError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        StratbenchError::config_invalid(
            "backtest",
            field,
            format!("invalid {} format, expected YYYY-MM-DD", field),
        )
    })
}

pub fn check_date_order(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), StratbenchError> {
    match (start, end) {
        (Some(start), Some(end)) if start >= end => Err(StratbenchError::config_invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        )),
        _ => Ok(()),
    }
}

/// `tickers` takes precedence over the single `ticker` key.
pub fn tickers(config: &dyn ConfigPort) -> Result<Vec<String>, StratbenchError> {
    let (raw, key) = match (
        config.get_string("backtest", "tickers"),
        config.get_string("backtest", "ticker"),
    ) {
        (Some(list), _) if !list.trim().is_empty() => (list, "tickers"),
        (_, Some(single)) if !single.trim().is_empty() => (single, "ticker"),
        _ => return Ok(Vec::new()),
    };

    parse_tickers(&raw).map_err(|e| StratbenchError::config_invalid("backtest", key, e.to_string()))
}

/// Strategies named in `[backtest] strategies`, parameterised from their
/// own sections and validated. Defaults to the standard four.
pub fn build_strategies(config: &dyn ConfigPort) -> Result<Vec<StrategyConfig>, StratbenchError> {
    let names = config
        .get_list("backtest", "strategies")
        .filter(|names| !names.is_empty());

    let base = match names {
        Some(names) => names
            .iter()
            .map(|name| name.parse::<StrategyConfig>())
            .collect::<Result<Vec<_>, _>>()?,
        None => StrategyConfig::defaults(),
    };

    base.into_iter()
        .map(|strategy| parameterised(config, strategy))
        .collect()
}

/// A single strategy by name, parameterised from its config section.
pub fn configured_strategy(
    config: &dyn ConfigPort,
    name: &str,
) -> Result<StrategyConfig, StratbenchError> {
    parameterised(config, name.parse()?)
}

fn parameterised(
    config: &dyn ConfigPort,
    strategy: StrategyConfig,
) -> Result<StrategyConfig, StratbenchError> {
    let strategy = with_config_params(config, strategy)?;
    strategy.validate()?;
    Ok(strategy)
}

fn with_config_params(
    config: &dyn ConfigPort,
    strategy: StrategyConfig,
) -> Result<StrategyConfig, StratbenchError> {
    Ok(match strategy {
        StrategyConfig::BuyAndHold => StrategyConfig::BuyAndHold,
        StrategyConfig::Sma { .. } => StrategyConfig::Sma {
            window: get_usize(config, "sma", "window", DEFAULT_SMA_WINDOW)?,
        },
        StrategyConfig::Rsi { .. } => StrategyConfig::Rsi {
            period: get_usize(config, "rsi", "period", DEFAULT_RSI_PERIOD)?,
            oversold: config.get_double("rsi", "oversold", DEFAULT_RSI_OVERSOLD),
            overbought: config.get_double("rsi", "overbought", DEFAULT_RSI_OVERBOUGHT),
        },
        StrategyConfig::Macd { .. } => StrategyConfig::Macd {
            fast: get_usize(config, "macd", "fast", macd::DEFAULT_FAST)?,
            slow: get_usize(config, "macd", "slow", macd::DEFAULT_SLOW)?,
            signal: get_usize(config, "macd", "signal", macd::DEFAULT_SIGNAL)?,
        },
    })
}

pub fn min_rows(config: &dyn ConfigPort) -> Result<usize, StratbenchError> {
    get_usize(config, "validation", "min_rows", DEFAULT_MIN_ROWS)
}

fn get_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, StratbenchError> {
    let value = config.get_int(section, key, default as i64);
    usize::try_from(value).map_err(|_| {
        StratbenchError::config_invalid(section, key, format!("{} must be non-negative", key))
    })
}
