//! CLI definition and dispatch.
//!
//! Results go to stdout; progress and diagnostics go to the tracing
//! subscriber on stderr.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestResult, RunOutput, backtest_ticker};
use crate::domain::comparison::{TickerComparison, compare_strategies, compare_tickers};
use crate::domain::config_validation::{
    build_strategies, check_date_order, config_date, configured_strategy, min_rows, starting_cash,
    tickers, validate_backtest_config,
};
use crate::domain::data_quality::{ValidationSummary, validate_universe_data};
use crate::domain::error::StratbenchError;
use crate::domain::universe::{SkippedTicker, parse_tickers};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(
    name = "stratbench",
    about = "Compare indicator trading strategies on daily price history"
)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

/// Run-range overrides shared by `compare` and `backtest`.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Ticker, or comma-separated tickers
    #[arg(long)]
    pub ticker: Option<String>,
    /// First date, YYYY-MM-DD
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Last date, YYYY-MM-DD
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// Starting cash
    #[arg(long)]
    pub cash: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every configured strategy and print a comparison table
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Run one strategy and print its trade log
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// List tickers in the price store
    ListTickers {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Report data-quality issues in the price store
    ValidateData {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: Option<String>,
    },
    /// Load a CSV file into the SQLite store
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        ticker: String,
        #[arg(long)]
        file: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Compare { config, run } => run_compare(&config, &run),
        Command::Backtest {
            config,
            strategy,
            run,
        } => run_backtest(&config, &strategy, &run),
        Command::ListTickers { config } => run_list_tickers(&config),
        Command::ValidateData { config, ticker } => run_validate_data(&config, ticker.as_deref()),
        Command::Import {
            config,
            ticker,
            file,
        } => run_import(&config, &ticker, &file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StratbenchError> {
    tracing::info!("loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Price store selected by `[data] source`.
pub fn open_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, StratbenchError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "sqlite".to_string());

    match source.trim().to_lowercase().as_str() {
        "csv" => Ok(Box::new(CsvAdapter::from_config(config)?)),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Box::new(
            crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?,
        )),
        other => Err(StratbenchError::config_invalid(
            "data",
            "source",
            format!("unsupported data source: {other}"),
        )),
    }
}

/// `--ticker` wins over the configured list.
pub fn resolve_tickers(
    ticker_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, StratbenchError> {
    let resolved = match ticker_override {
        Some(raw) => parse_tickers(raw)
            .map_err(|e| StratbenchError::config_invalid("backtest", "ticker", e.to_string()))?,
        None => tickers(config)?,
    };

    if resolved.is_empty() {
        return Err(StratbenchError::ConfigMissing {
            section: "backtest".into(),
            key: "ticker".into(),
        });
    }
    Ok(resolved)
}

/// Merge CLI overrides with config values. A missing start or end date
/// falls back to the stored data range, widened across all `tickers`.
pub fn build_backtest_config(
    config: &dyn ConfigPort,
    args: &RunArgs,
    data_port: &dyn DataPort,
    tickers: &[String],
) -> Result<BacktestConfig, StratbenchError> {
    let starting_cash = match args.cash {
        Some(cash) if cash.is_finite() && cash > 0.0 => cash,
        Some(_) => {
            return Err(StratbenchError::config_invalid(
                "backtest",
                "starting_cash",
                "starting_cash must be positive",
            ));
        }
        None => starting_cash(config)?,
    };

    let mut start = args.start.or(config_date(config, "start_date")?);
    let mut end = args.end.or(config_date(config, "end_date")?);

    if start.is_none() || end.is_none() {
        let (first, last) = stored_range(data_port, tickers)?;
        start = start.or(Some(first));
        end = end.or(Some(last));
    }

    check_date_order(start, end)?;
    match (start, end) {
        (Some(start_date), Some(end_date)) => Ok(BacktestConfig {
            start_date,
            end_date,
            starting_cash,
        }),
        _ => Err(StratbenchError::ConfigMissing {
            section: "backtest".into(),
            key: "start_date".into(),
        }),
    }
}

fn stored_range(
    data_port: &dyn DataPort,
    tickers: &[String],
) -> Result<(NaiveDate, NaiveDate), StratbenchError> {
    let mut range: Option<(NaiveDate, NaiveDate)> = None;
    for ticker in tickers {
        if let Some((first, last, _)) = data_port.get_data_range(ticker)? {
            range = Some(match range {
                Some((lo, hi)) => (lo.min(first), hi.max(last)),
                None => (first, last),
            });
        }
    }

    range.ok_or_else(|| StratbenchError::DataUnavailable {
        ticker: tickers.join(","),
    })
}

fn run_compare(config_path: &Path, args: &RunArgs) -> Result<(), StratbenchError> {
    let config = load_config(config_path)?;
    validate_backtest_config(&config)?;

    let strategies = build_strategies(&config)?;
    let data_port = open_data_port(&config)?;
    let tickers = resolve_tickers(args.ticker.as_deref(), &config)?;
    let bt_config = build_backtest_config(&config, args, data_port.as_ref(), &tickers)?;

    tracing::info!(
        tickers = tickers.len(),
        start = %bt_config.start_date,
        end = %bt_config.end_date,
        "running comparison"
    );

    if let [ticker] = tickers.as_slice() {
        let comparison = compare_strategies(data_port.as_ref(), ticker, &bt_config, &strategies)?;
        print!("{}", format_comparison(&comparison, &bt_config));
        return Ok(());
    }

    let batch = compare_tickers(data_port.as_ref(), &tickers, &bt_config, &strategies);
    for comparison in &batch.comparisons {
        print!("{}", format_comparison(comparison, &bt_config));
        println!();
    }
    for skipped in &batch.skipped {
        println!("skipped {}: {}", skipped.ticker, skipped.reason);
    }

    if batch.comparisons.is_empty() {
        return Err(StratbenchError::DataUnavailable {
            ticker: tickers.join(","),
        });
    }
    Ok(())
}

fn run_backtest(config_path: &Path, strategy_name: &str, args: &RunArgs) -> Result<(), StratbenchError> {
    let config = load_config(config_path)?;
    validate_backtest_config(&config)?;

    let strategy = configured_strategy(&config, strategy_name)?;
    let data_port = open_data_port(&config)?;
    let tickers = resolve_tickers(args.ticker.as_deref(), &config)?;
    let bt_config = build_backtest_config(&config, args, data_port.as_ref(), &tickers)?;

    if let [ticker] = tickers.as_slice() {
        let output = backtest_ticker(data_port.as_ref(), ticker, strategy, &bt_config)?;
        print!("{}", format_backtest(&output));
        return Ok(());
    }

    let mut completed = 0;
    let mut skipped = Vec::new();
    for ticker in &tickers {
        match backtest_ticker(data_port.as_ref(), ticker, strategy, &bt_config) {
            Ok(output) => {
                print!("{}", format_backtest(&output));
                println!();
                completed += 1;
            }
            Err(e) => {
                tracing::warn!(ticker = %ticker, "skipping ticker: {e}");
                skipped.push(SkippedTicker::from_error(ticker, e));
            }
        }
    }
    for entry in &skipped {
        println!("skipped {}: {}", entry.ticker, entry.reason);
    }

    if completed == 0 {
        return Err(StratbenchError::DataUnavailable {
            ticker: tickers.join(","),
        });
    }
    Ok(())
}

fn run_list_tickers(config_path: &Path) -> Result<(), StratbenchError> {
    let config = load_config(config_path)?;
    let data_port = open_data_port(&config)?;

    let tickers = data_port.list_tickers()?;
    for ticker in &tickers {
        println!("{ticker}");
    }
    tracing::info!("{} tickers found", tickers.len());
    Ok(())
}

fn run_validate_data(config_path: &Path, ticker: Option<&str>) -> Result<(), StratbenchError> {
    let config = load_config(config_path)?;
    let threshold = min_rows(&config)?;
    let data_port = open_data_port(&config)?;

    let tickers = match ticker {
        Some(raw) => resolve_tickers(Some(raw), &config)?,
        None => data_port.list_tickers()?.into_iter().collect(),
    };

    let summary = validate_universe_data(data_port.as_ref(), &tickers, threshold)?;
    print!("{}", format_validation(&summary));
    Ok(())
}

#[cfg(feature = "sqlite")]
fn run_import(config_path: &Path, ticker: &str, file: &Path) -> Result<(), StratbenchError> {
    use crate::adapters::csv_adapter::read_csv_file;
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let config = load_config(config_path)?;
    let store = SqliteAdapter::from_config(&config)?;

    let ticker = ticker.trim().to_uppercase();
    let bars = read_csv_file(file, &ticker)?;
    let rows = store.insert_bars(&bars)?;
    println!("imported {rows} bars for {ticker}");
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn run_import(_config_path: &Path, _ticker: &str, _file: &Path) -> Result<(), StratbenchError> {
    Err(StratbenchError::config_invalid(
        "data",
        "source",
        "import requires the sqlite feature",
    ))
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value)
}

pub fn format_comparison(comparison: &TickerComparison, config: &BacktestConfig) -> String {
    let mut lines = vec![
        format!(
            "{}: {} bars, {} to {}, starting cash {:.2}",
            comparison.ticker, comparison.bars, config.start_date, config.end_date, config.starting_cash
        ),
        format!(
            "{:<22} {:>10} {:>10} {:>10} {:>7} {:>9}",
            "Strategy", "Return", "Annual", "MaxDD", "Trades", "WinRate"
        ),
    ];

    for RunOutput { metrics, .. } in &comparison.runs {
        lines.push(format!(
            "{:<22} {:>10} {:>10} {:>10} {:>7} {:>9}",
            metrics.strategy.to_string(),
            pct(metrics.total_return_pct),
            pct(metrics.annual_return_pct),
            pct(metrics.max_drawdown_pct),
            metrics.num_trades,
            pct(metrics.win_rate_pct),
        ));
    }

    lines.join("\n") + "\n"
}

pub fn format_backtest(output: &RunOutput) -> String {
    let BacktestResult {
        ticker,
        strategy,
        start_date,
        end_date,
        starting_cash,
        ending_cash,
        total_return_pct,
        num_trades,
        trade_log,
    } = &output.result;

    let mut lines = vec![
        format!("{ticker} {strategy}: {start_date} to {end_date}"),
        format!("Starting cash:  {:.2}", starting_cash),
        format!("Ending cash:    {:.2}", ending_cash),
        format!("Total return:   {}", pct(*total_return_pct)),
        format!("Annual return:  {}", pct(output.metrics.annual_return_pct)),
        format!("Max drawdown:   {}", pct(output.metrics.max_drawdown_pct)),
        format!("Win rate:       {}", pct(output.metrics.win_rate_pct)),
        format!("Trades:         {num_trades}"),
    ];

    if !trade_log.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "{:<10} {:<11} {:>12} {:>10}",
            "Date", "Action", "Price", "Shares"
        ));
        for trade in trade_log {
            lines.push(format!(
                "{:<10} {:<11} {:>12.2} {:>10}",
                trade.date.to_string(),
                trade.action.to_string(),
                trade.price,
                trade.shares
            ));
        }
    }

    lines.join("\n") + "\n"
}

pub fn format_validation(summary: &ValidationSummary) -> String {
    let mut lines = Vec::new();
    for report in &summary.problem_tickers {
        let issues: Vec<String> = report.issues.iter().map(|i| i.to_string()).collect();
        lines.push(format!(
            "{} ({} rows): {}",
            report.ticker,
            report.total_rows,
            issues.join("; ")
        ));
    }
    lines.push(format!("Total tickers: {}", summary.total_tickers));
    lines.push(format!(
        "Tickers with issues: {}",
        summary.problem_tickers.len()
    ));
    lines.join("\n") + "\n"
}
