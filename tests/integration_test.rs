//! Integration tests across the domain pipeline.
//!
//! Tests cover:
//! - Backtests of every rule-based strategy over a sliced test window
//! - Swarm search on the train window, replayed on the test window
//! - Feature/label export and prediction-driven trading
//! - CSV price loading feeding the backtest

mod common;

use approx::assert_relative_eq;
use common::*;
use std::sync::Arc;
use swarmtrader::adapters::csv_adapter::CsvAdapter;
use swarmtrader::domain::backtest::{BacktestConfig, FillPrice, run_backtest};
use swarmtrader::domain::error::SwarmtraderError;
use swarmtrader::domain::features::{
    FEATURE_COLUMNS, LabelOracle, LabelParams, Standardizer, accuracy, build_features,
    build_labels, split_by_date,
};
use swarmtrader::domain::ma_rules::{MovingAverageRule, SignalMode};
use swarmtrader::domain::price_series::TrainTestSplit;
use swarmtrader::domain::representation::{
    DecodedStrategyParams, Normalization, SwarmRepresentation, cost_from_values,
};
use swarmtrader::domain::strategy::{
    BuyAndHoldStrategy, ClassicParams, ClassicStrategy, MovingAverageCrossStrategy,
    OneMovingAverageStrategy, PredictionStrategy, Strategy,
};
use swarmtrader::domain::swarm::{GlobalBestPso, SwarmConfig, SwarmOptions};
use swarmtrader::ports::data_port::PriceDataPort;

fn split() -> TrainTestSplit {
    TrainTestSplit::new(
        date(2020, 1, 1),
        date(2021, 12, 31),
        date(2022, 1, 1),
        date(2022, 12, 31),
    )
    .unwrap()
}

mod strategy_backtests {
    use super::*;

    #[test]
    fn every_rule_strategy_runs_on_the_test_window() {
        let series = wave_series(date(2020, 1, 1), 1100);
        let window = split().test(&series).unwrap();
        let config = BacktestConfig::default();

        let mut strategies: Vec<Box<dyn Strategy>> = vec![
            Box::new(BuyAndHoldStrategy::new()),
            Box::new(ClassicStrategy::new(&series, ClassicParams::default()).unwrap()),
            Box::new(OneMovingAverageStrategy::new(&series, 20).unwrap()),
            Box::new(
                MovingAverageCrossStrategy::new(&series, MovingAverageRule { short: 5, long: 20 })
                    .unwrap(),
            ),
        ];

        for strategy in strategies.iter_mut() {
            let result = run_backtest(&window, strategy.as_mut(), &config).unwrap();
            assert_eq!(result.portfolio.equity_curve.len(), window.len());
            assert_eq!(result.portfolio.equity_curve[0].date, date(2022, 1, 1));
            assert!(result.final_value() > 0.0);
            assert!(result.portfolio.cash >= 0.0);
        }
    }

    #[test]
    fn cross_strategy_trades_the_cycle() {
        let series = wave_series(date(2020, 1, 1), 1100);
        let window = split().test(&series).unwrap();
        let rule = MovingAverageRule { short: 5, long: 20 };
        let mut strategy = MovingAverageCrossStrategy::new(&series, rule).unwrap();

        let result = run_backtest(&window, &mut strategy, &BacktestConfig::default()).unwrap();
        // a 50-day cycle gives several crosses a year
        assert!(result.buys() >= 3, "buys = {}", result.buys());
        assert!(result.sells() >= 2, "sells = {}", result.sells());
        assert!(result.buys() - result.sells() <= 1);
    }

    #[test]
    fn buy_and_hold_tracks_price_change() {
        let series = series_from_closes(date(2024, 1, 1), &[50.0, 55.0, 60.0, 75.0]);
        let mut hold = BuyAndHoldStrategy::new();
        let result = run_backtest(&series, &mut hold, &BacktestConfig::default()).unwrap();
        assert_eq!(result.buys(), 1);
        assert_eq!(result.sells(), 0);
        assert_relative_eq!(result.total_return(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn next_open_fill_shifts_entry() {
        let series = series_from_closes(date(2024, 1, 1), &[50.0, 55.0, 60.0]);
        let config = BacktestConfig {
            fill: FillPrice::NextOpen,
            ..BacktestConfig::default()
        };
        let result = run_backtest(&series, &mut BuyAndHoldStrategy::new(), &config).unwrap();
        assert_eq!(result.orders.len(), 1);
        assert_eq!(result.orders[0].date, date(2024, 1, 2));
        assert_relative_eq!(result.orders[0].price, 55.0);
    }

    #[test]
    fn empty_test_window_is_an_error() {
        let series = wave_series(date(2020, 1, 1), 100);
        let result = split().test(&series);
        assert!(result.is_err());
    }
}

mod swarm_pipeline {
    use super::*;

    fn representation(normalization: Normalization) -> SwarmRepresentation {
        SwarmRepresentation::new(
            wave_series(date(2020, 1, 1), 1100),
            &[5, 10, 20],
            normalization,
            SignalMode::Sign,
            BacktestConfig::default(),
        )
        .unwrap()
    }

    fn small_swarm() -> SwarmConfig {
        SwarmConfig {
            n_particles: 6,
            iters: 4,
            options: SwarmOptions::default(),
            seed: 11,
        }
    }

    #[test]
    fn optimizes_on_train_and_replays_on_test() {
        let rep = representation(Normalization::L1);
        let split = split();
        assert_eq!(rep.dimensions(), 5);

        let pso = GlobalBestPso::new(small_swarm(), rep.dimensions(), rep.bounds()).unwrap();
        let optimum = pso
            .optimize(|batch| rep.cost_function(batch, split.train_start, split.train_end))
            .unwrap();
        assert_eq!(optimum.cost_history.len(), 4);
        assert_eq!(optimum.best_position.len(), 5);

        // the reported best cost is reproducible by a single evaluation
        let train = split.train(rep.series()).unwrap();
        let again = rep.evaluate(&optimum.best_position, &train).unwrap();
        assert_relative_eq!(again, optimum.best_cost, epsilon = 1e-12);

        let params = rep.decode(&optimum.best_position).unwrap();
        let abs_sum: f64 = params.weights.iter().map(|w| w.abs()).sum();
        assert!(abs_sum == 0.0 || (abs_sum - 1.0).abs() < 1e-9);

        let window = split.test(rep.series()).unwrap();
        let mut strategy = rep.build_strategy(params).unwrap();
        let result = run_backtest(&window, &mut strategy, rep.backtest_config()).unwrap();
        assert_eq!(result.portfolio.equity_curve.len(), window.len());
    }

    #[test]
    fn optimization_is_deterministic_under_a_seed() {
        let rep = representation(Normalization::Exponential);
        let split = split();
        let run = || {
            GlobalBestPso::new(small_swarm(), rep.dimensions(), rep.bounds())
                .unwrap()
                .optimize(|batch| rep.cost_function(batch, split.train_start, split.train_end))
                .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn cost_is_negative_return() {
        let rep = representation(Normalization::L1);
        let split = split();
        let train = split.train(rep.series()).unwrap();
        let candidate = vec![1.0, 0.0, 0.0, 0.5, -0.5];

        let params = rep.decode(&candidate).unwrap();
        let mut strategy = rep.build_strategy(params).unwrap();
        let result = run_backtest(&train, &mut strategy, rep.backtest_config()).unwrap();

        let costs = rep
            .cost_function(&[candidate], split.train_start, split.train_end)
            .unwrap();
        assert_relative_eq!(
            costs[0],
            cost_from_values(result.initial_value(), result.final_value()),
            epsilon = 1e-12
        );
        assert_relative_eq!(costs[0], -result.total_return(), epsilon = 1e-12);
    }

    #[test]
    fn single_rule_combined_matches_crossover() {
        let series = wave_series(date(2020, 1, 1), 400);
        let rep = SwarmRepresentation::new(
            series.clone(),
            &[5, 20],
            Normalization::L1,
            SignalMode::Sign,
            BacktestConfig::default(),
        )
        .unwrap();
        // weight 1, buy when bullish, sell when bearish
        let params = DecodedStrategyParams {
            weights: vec![1.0],
            buy_threshold: 1.0,
            sell_threshold: -1.0,
        };
        let mut combined = rep.build_strategy(params).unwrap();
        let rule = MovingAverageRule { short: 5, long: 20 };
        let mut cross = MovingAverageCrossStrategy::new(&series, rule).unwrap();

        // start on a bearish bar so both wait for the same cross
        let start = series.bars()[130].date;
        let window = series.range(start, series.last_date()).unwrap();
        let config = BacktestConfig::default();
        let a = run_backtest(&window, &mut combined, &config).unwrap();
        let b = run_backtest(&window, &mut cross, &config).unwrap();
        assert!(b.buys() >= 1);
        assert_eq!(a.buys(), b.buys());
        assert_eq!(a.sells(), b.sells());
        assert_relative_eq!(a.final_value(), b.final_value(), epsilon = 1e-6);
    }

    #[test]
    fn malformed_candidate_fails_the_batch() {
        let rep = representation(Normalization::L1);
        let split = split();
        let result = rep.cost_function(&[vec![0.5]], split.train_start, split.train_end);
        assert!(matches!(result, Err(SwarmtraderError::Candidate { .. })));
    }
}

mod labels_pipeline {
    use super::*;

    #[test]
    fn builds_standardized_partitions() {
        let series = wave_series(date(2020, 1, 1), 1100);
        let labels = build_labels(&series, &LabelParams::default());
        let matrix = build_features(&series);
        assert_eq!(matrix.columns, FEATURE_COLUMNS.to_vec());

        let (train, test) = split_by_date(&matrix, &labels, &split()).unwrap();
        assert!(!train.is_empty());
        assert!(!test.is_empty());
        assert!(train.dates.last().unwrap() < test.dates.first().unwrap());
        assert!(train.rows.iter().all(|r| r.len() == FEATURE_COLUMNS.len()));

        let scaler = Standardizer::fit(&train.rows).unwrap();
        let scaled = scaler.transform(&train.rows);
        let n = scaled.len() as f64;
        for col in 0..FEATURE_COLUMNS.len() {
            let mean: f64 = scaled.iter().map(|r| r[col]).sum::<f64>() / n;
            assert!(mean.abs() < 1e-9, "column {} mean {}", FEATURE_COLUMNS[col], mean);
        }
    }

    #[test]
    fn oracle_predictions_are_perfect_and_tradeable() {
        let series = wave_series(date(2020, 1, 1), 1100);
        let labels = build_labels(&series, &LabelParams::default());
        let oracle = Arc::new(LabelOracle::new(&series, &labels));

        let (_, test) = split_by_date(&build_features(&series), &labels, &split()).unwrap();
        assert_relative_eq!(accuracy(oracle.as_ref(), &test), 1.0);

        let window = split().test(&series).unwrap();
        let mut strategy = PredictionStrategy::new(oracle);
        let result = run_backtest(&window, &mut strategy, &BacktestConfig::default()).unwrap();
        assert!(result.buys() >= 1);
        assert!(result.total_return() > 0.0);
    }
}

mod csv_loading {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn csv_round_trip_feeds_backtest() {
        let dir = TempDir::new().unwrap();
        let series = wave_series(date(2020, 1, 1), 60);
        let path = write_price_csv(dir.path(), &series);

        let loaded = CsvAdapter::new(&path).load_prices().unwrap();
        assert_eq!(loaded.len(), 60);
        assert_eq!(loaded.first_date(), date(2020, 1, 1));

        let mut hold = BuyAndHoldStrategy::new();
        let result = run_backtest(&loaded, &mut hold, &BacktestConfig::default()).unwrap();
        let expected = loaded.bars()[59].close / loaded.bars()[0].close - 1.0;
        assert_relative_eq!(result.total_return(), expected, epsilon = 1e-9);
    }
}
