//! Property tests for decoding and backtest invariants.
//!
//! Uses proptest to verify:
//! 1. Decoding never panics and normalizes weights
//! 2. Buy-and-hold does exactly one buy and no sells
//! 3. Cash and portfolio value never go negative
//! 4. Identical inputs give identical results
//! 5. The buy threshold is inclusive

mod common;

use common::*;
use proptest::prelude::*;
use swarmtrader::domain::backtest::{BacktestConfig, run_backtest};
use swarmtrader::domain::execution::ExecutionConfig;
use swarmtrader::domain::ma_rules::SignalMode;
use swarmtrader::domain::representation::{Normalization, SwarmRepresentation, decode};
use swarmtrader::domain::strategy::combined_signal::{combine, threshold_decision};
use swarmtrader::domain::strategy::{BuyAndHoldStrategy, Decision};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_vector() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0..1.0_f64, 3..12)
}

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..500.0_f64, 2..120)
}

fn arb_commission() -> impl Strategy<Value = f64> {
    0.0..0.05_f64
}

// ── 1. Decoding ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn l1_weights_have_unit_abs_sum(vector in arb_vector()) {
        let params = decode(&vector, Normalization::L1).unwrap();
        let abs_sum: f64 = params.weights.iter().map(|w| w.abs()).sum();
        prop_assert!(abs_sum == 0.0 || (abs_sum - 1.0).abs() < 1e-9);
        prop_assert_eq!(params.weights.len(), vector.len() - 2);
    }

    #[test]
    fn exponential_weights_are_a_distribution(vector in arb_vector()) {
        let params = decode(&vector, Normalization::Exponential).unwrap();
        let sum: f64 = params.weights.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);
        prop_assert!(params.weights.iter().all(|&w| w >= 0.0));
    }

    #[test]
    fn thresholds_pass_through(vector in prop::collection::vec(-5.0..5.0_f64, 2..8)) {
        let params = decode(&vector, Normalization::L1).unwrap();
        prop_assert_eq!(params.buy_threshold, vector[vector.len() - 2]);
        prop_assert_eq!(params.sell_threshold, vector[vector.len() - 1]);
    }

    #[test]
    fn decode_never_panics(vector in prop::collection::vec(any::<f64>(), 0..10)) {
        let _ = decode(&vector, Normalization::L1);
        let _ = decode(&vector, Normalization::Exponential);
    }
}

// ── 2/3. Buy and hold, solvency ──────────────────────────────────────

proptest! {
    #[test]
    fn buy_and_hold_buys_once(closes in arb_closes(), commission in arb_commission()) {
        let series = series_from_closes(date(2020, 1, 1), &closes);
        let config = BacktestConfig {
            execution: ExecutionConfig { commission },
            ..BacktestConfig::default()
        };
        let result = run_backtest(&series, &mut BuyAndHoldStrategy::new(), &config).unwrap();
        prop_assert_eq!(result.buys(), 1);
        prop_assert_eq!(result.sells(), 0);
        prop_assert!(result.portfolio.cash >= 0.0);
    }

    #[test]
    fn combined_strategy_stays_solvent(
        closes in prop::collection::vec(1.0..500.0_f64, 30..150),
        vector in prop::collection::vec(-1.0..1.0_f64, 5),
        commission in arb_commission(),
    ) {
        let series = series_from_closes(date(2020, 1, 1), &closes);
        let config = BacktestConfig {
            execution: ExecutionConfig { commission },
            ..BacktestConfig::default()
        };
        let rep = SwarmRepresentation::new(
            series.clone(),
            &[3, 5, 10],
            Normalization::L1,
            SignalMode::Sign,
            config,
        )
        .unwrap();
        let mut strategy = rep.build_strategy(rep.decode(&vector).unwrap()).unwrap();
        let result = run_backtest(&series, &mut strategy, &config).unwrap();

        prop_assert!(result.portfolio.cash >= 0.0);
        prop_assert!(result.portfolio.equity_curve.iter().all(|p| p.equity >= 0.0));
        prop_assert!(result.sells() <= result.buys());
    }
}

// ── 4. Determinism ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn cost_is_deterministic(
        closes in prop::collection::vec(1.0..500.0_f64, 30..100),
        vector in prop::collection::vec(-1.0..1.0_f64, 5),
    ) {
        let series = series_from_closes(date(2020, 1, 1), &closes);
        let rep = SwarmRepresentation::new(
            series.clone(),
            &[3, 5, 10],
            Normalization::Exponential,
            SignalMode::Sign,
            BacktestConfig::default(),
        )
        .unwrap();
        let batch = vec![vector.clone(), vector.clone()];
        let costs = rep
            .cost_function(&batch, series.first_date(), series.last_date())
            .unwrap();
        prop_assert_eq!(costs[0], costs[1]);

        let run = || {
            let mut strategy = rep.build_strategy(rep.decode(&vector).unwrap()).unwrap();
            run_backtest(&series, &mut strategy, rep.backtest_config()).unwrap()
        };
        let (a, b) = (run(), run());
        prop_assert_eq!(a.equity_series(), b.equity_series());
        prop_assert_eq!(a.orders, b.orders);
    }
}

// ── 5. Thresholds ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn aggregate_at_buy_threshold_buys(vector in prop::collection::vec(0.0..1.0_f64, 4)) {
        let mut params = decode(&vector, Normalization::L1).unwrap();
        let signals = vec![1.0; params.weights.len()];
        let aggregate = combine(&params.weights, &signals);
        params.buy_threshold = aggregate;
        prop_assert_eq!(threshold_decision(aggregate, &params, false), Decision::Buy);
    }
}

#[test]
fn half_weights_buy_at_half_threshold() {
    let params = decode(&[0.5, 0.5, 0.5, -0.5], Normalization::L1).unwrap();
    let aggregate = combine(&params.weights, &[1.0, 0.0]);
    assert_eq!(aggregate, 0.5);
    assert_eq!(threshold_decision(aggregate, &params, false), Decision::Buy);
}
