//! End-to-end tests: price series through signals, simulation and metrics,
//! against the mock data port and an in-memory SQLite store.

mod common;

use approx::assert_relative_eq;
use common::*;
use stratbench::domain::backtest::{BacktestConfig, backtest_ticker, run_strategy};
use stratbench::domain::comparison::{compare_strategies, compare_tickers};
use stratbench::domain::data_quality::{DataIssue, validate_universe_data};
use stratbench::domain::error::StratbenchError;
use stratbench::domain::execution::TradeAction;
use stratbench::domain::indicator::rsi;
use stratbench::domain::ohlcv::closes;
use stratbench::domain::signal::Signal;
use stratbench::domain::strategy::StrategyConfig;
use stratbench::domain::universe::SkipReason;

mod scenarios {
    use super::*;

    #[test]
    fn buy_and_hold_five_bars() {
        let bars = bars_from_closes("NVDA", &[10.0, 11.0, 9.0, 12.0, 8.0]);
        let out = run_strategy(&bars, StrategyConfig::BuyAndHold, 100.0);

        let log = &out.result.trade_log;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action, TradeAction::Buy);
        assert_eq!(log[0].date, bars[0].date);
        assert_eq!(log[0].shares, 10);
        assert_eq!(log[0].price, 10.0);
        assert!(log[1].action.is_exit());
        assert_eq!(log[1].date, bars[4].date);
        assert_eq!(log[1].price, 8.0);

        assert_relative_eq!(out.result.ending_cash, 80.0);
        assert_relative_eq!(out.metrics.total_return_pct, -20.0, epsilon = 1e-9);
        assert_eq!(out.metrics.num_trades, 2);
        assert_eq!(out.metrics.win_rate_pct, 0.0);
        assert_eq!(
            out.metrics.portfolio_value_series,
            vec![100.0, 110.0, 90.0, 120.0, 80.0]
        );
    }

    #[test]
    fn constant_prices_never_trade() {
        let bars = bars_from_closes("FLAT", &[50.0; 60]);
        for strategy in [
            StrategyConfig::sma_default(),
            StrategyConfig::rsi_default(),
            StrategyConfig::macd_default(),
        ] {
            let out = run_strategy(&bars, strategy, 10_000.0);
            assert_eq!(out.metrics.num_trades, 0, "{strategy}");
            assert_eq!(out.metrics.total_return_pct, 0.0, "{strategy}");
            assert_eq!(out.metrics.annual_return_pct, 0.0, "{strategy}");
            assert_eq!(out.metrics.max_drawdown_pct, 0.0, "{strategy}");
            assert_eq!(out.metrics.win_rate_pct, 0.0, "{strategy}");
            assert!(
                out.metrics
                    .portfolio_value_series
                    .iter()
                    .all(|&v| v == 10_000.0)
            );
        }
    }

    #[test]
    fn rising_prices_pin_rsi_and_never_buy() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let bars = bars_from_closes("UP", &prices);
        let strategy = StrategyConfig::rsi_default();

        let values = rsi(&closes(&bars), 14);
        assert!(values[14..].iter().all(|v| *v == Some(100.0)));

        let signals = strategy.generate(&bars);
        assert!(!signals.contains(&Signal::Buy));

        let out = run_strategy(&bars, strategy, 10_000.0);
        assert_eq!(out.metrics.num_trades, 0);
        assert_eq!(out.result.ending_cash, 10_000.0);
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn backtest_ticker_uses_port_range() {
        let bars = bars_from_closes("NVDA", &wave_closes(200));
        let port = MockDataPort::new().with_bars("NVDA", bars.clone());
        let config = BacktestConfig {
            start_date: bars[50].date,
            end_date: bars[149].date,
            starting_cash: 5_000.0,
        };

        let out = backtest_ticker(&port, "NVDA", StrategyConfig::BuyAndHold, &config).unwrap();
        assert_eq!(out.result.start_date, bars[50].date);
        assert_eq!(out.result.end_date, bars[149].date);
        assert_eq!(out.metrics.portfolio_value_series.len(), 100);
        assert_eq!(out.result.starting_cash, 5_000.0);
    }

    #[test]
    fn empty_range_is_data_unavailable() {
        let port = MockDataPort::new().with_bars("NVDA", bars_from_closes("NVDA", &[1.0, 2.0]));
        let config = BacktestConfig {
            start_date: date(2030, 1, 1),
            end_date: date(2030, 12, 31),
            starting_cash: 1_000.0,
        };
        let err = backtest_ticker(&port, "NVDA", StrategyConfig::BuyAndHold, &config).unwrap_err();
        assert!(matches!(err, StratbenchError::DataUnavailable { ticker } if ticker == "NVDA"));
    }

    #[test]
    fn comparison_covers_every_strategy_and_ends_flat() {
        let port = MockDataPort::new().with_bars("NVDA", bars_from_closes("NVDA", &wave_closes(300)));
        let comparison =
            compare_strategies(&port, "NVDA", &sample_config(), &StrategyConfig::defaults()).unwrap();

        assert_eq!(comparison.runs.len(), 4);
        for run in &comparison.runs {
            let trades = &run.result.trade_log;
            assert_eq!(trades.len() % 2, 0, "{}", run.metrics.strategy);
            for pair in trades.chunks_exact(2) {
                assert_eq!(pair[0].action, TradeAction::Buy);
                assert!(pair[1].action.is_exit());
                assert!(pair[0].date <= pair[1].date);
            }
            let last_value = *run.metrics.portfolio_value_series.last().unwrap();
            assert_relative_eq!(last_value, run.result.ending_cash, epsilon = 1e-6);
        }
        assert!(comparison.runs.iter().skip(1).any(|r| r.metrics.num_trades > 0));
    }

    #[test]
    fn batch_skips_unavailable_and_failing_tickers() {
        let port = MockDataPort::new()
            .with_bars("NVDA", bars_from_closes("NVDA", &wave_closes(120)))
            .with_bars("AAPL", bars_from_closes("AAPL", &wave_closes(80)))
            .with_error("MSFT", "database is locked");

        let tickers: Vec<String> = ["NVDA", "TSLA", "MSFT", "AAPL"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let batch = compare_tickers(&port, &tickers, &sample_config(), &StrategyConfig::defaults());

        let compared: Vec<_> = batch.comparisons.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(compared, vec!["NVDA", "AAPL"]);
        assert_eq!(batch.skipped[0].ticker, "TSLA");
        assert_eq!(batch.skipped[0].reason, SkipReason::NoData);
        assert_eq!(batch.skipped[1].ticker, "MSFT");
        assert!(matches!(batch.skipped[1].reason, SkipReason::ProviderError(_)));

        let isolated = compare_strategies(&port, "NVDA", &sample_config(), &StrategyConfig::defaults())
            .unwrap();
        assert_eq!(batch.comparisons[0], isolated);
    }

    #[test]
    fn insufficient_history_runs_flat_for_indicator_strategies() {
        let port = MockDataPort::new().with_bars("NEW", bars_from_closes("NEW", &wave_closes(15)));
        let comparison =
            compare_strategies(&port, "NEW", &sample_config(), &StrategyConfig::defaults()).unwrap();

        // 15 bars: enough for RSI(14) but not SMA(20) or MACD(12,26,9)
        let by_name = |name: &str| {
            comparison
                .runs
                .iter()
                .find(|r| r.metrics.strategy.name() == name)
                .unwrap()
        };
        assert_eq!(by_name("buy_and_hold").metrics.num_trades, 2);
        assert_eq!(by_name("simple_moving_average").metrics.num_trades, 0);
        assert_eq!(by_name("macd").metrics.num_trades, 0);
        assert_eq!(by_name("macd").metrics.total_return_pct, 0.0);
    }
}

mod data_validation {
    use super::*;

    #[test]
    fn universe_summary_lists_problem_tickers() {
        let mut bad = bars_from_closes("BAD", &wave_closes(30));
        bad[3].volume = 0;
        bad[7].high = bad[7].low - 1.0;

        let port = MockDataPort::new()
            .with_bars("GOOD", bars_from_closes("GOOD", &wave_closes(30)))
            .with_bars("BAD", bad);

        let tickers = vec!["GOOD".to_string(), "BAD".to_string(), "NONE".to_string()];
        let summary = validate_universe_data(&port, &tickers, 20).unwrap();

        assert_eq!(summary.total_tickers, 3);
        let flagged: Vec<_> = summary.problem_tickers.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(flagged, vec!["BAD", "NONE"]);
        assert_eq!(
            summary.problem_tickers[0].issues,
            vec![
                DataIssue::HighBelowLow { rows: 1 },
                DataIssue::ZeroVolume { rows: 1 }
            ]
        );
        assert_eq!(
            summary.problem_tickers[1].issues,
            vec![DataIssue::LowRowCount {
                rows: 0,
                expected_min: 20
            }]
        );
    }

    #[test]
    fn provider_errors_propagate() {
        let port = MockDataPort::new().with_error("NVDA", "no such table: ohlcv");
        let err = validate_universe_data(&port, &["NVDA".to_string()], 10).unwrap_err();
        assert!(matches!(err, StratbenchError::DatabaseQuery { .. }));
    }
}

#[cfg(feature = "sqlite")]
mod sqlite_store {
    use super::*;
    use stratbench::adapters::sqlite_adapter::SqliteAdapter;
    use stratbench::ports::data_port::DataPort;

    #[test]
    fn stored_series_backtests_like_in_memory_series() {
        let bars = bars_from_closes("NVDA", &wave_closes(250));
        let store = SqliteAdapter::in_memory().unwrap();
        store.initialize_schema().unwrap();
        store.insert_bars(&bars).unwrap();

        let (first, last, count) = store.get_data_range("NVDA").unwrap().unwrap();
        assert_eq!((first, last, count), (bars[0].date, bars[249].date, 250));

        let config = BacktestConfig {
            start_date: first,
            end_date: last,
            starting_cash: 10_000.0,
        };
        let from_store =
            compare_strategies(&store, "NVDA", &config, &StrategyConfig::defaults()).unwrap();

        for (run, strategy) in from_store.runs.iter().zip(StrategyConfig::defaults()) {
            let expected = run_strategy(&bars, strategy, 10_000.0);
            assert_eq!(run, &expected);
        }
    }
}
