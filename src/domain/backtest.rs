//! Day-by-day backtest runner.
//!
//! The runner walks the bars of one series in order. On every bar the
//! strategy sees only the bars up to that one; its decision is filled either
//! at the same close or at the next bar's open, depending on [`FillPrice`].
//! Equity is marked to the close after any fill.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::error::SwarmtraderError;
use super::execution::{EntryResult, ExecutionConfig, enter_long, exit_long};
use super::metrics::Metrics;
use super::portfolio::Portfolio;
use super::price_series::PriceSeries;
use super::strategy::{Decision, MarketView, Strategy};

pub const DEFAULT_INITIAL_CASH: f64 = 6000.0;

/// Price at which a decision is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillPrice {
    /// Same bar's close.
    #[default]
    Close,
    /// Next bar's open; an order left on the last bar is dropped.
    NextOpen,
}

impl FromStr for FillPrice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "close" => Ok(FillPrice::Close),
            "next_open" | "next-open" | "open" => Ok(FillPrice::NextOpen),
            other => Err(format!("unknown fill '{}', expected close or next_open", other)),
        }
    }
}

impl fmt::Display for FillPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillPrice::Close => f.write_str("close"),
            FillPrice::NextOpen => f.write_str("next_open"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub execution: ExecutionConfig,
    pub fill: FillPrice,
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: DEFAULT_INITIAL_CASH,
            execution: ExecutionConfig::default(),
            fill: FillPrice::Close,
            risk_free_rate: 0.0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), SwarmtraderError> {
        if !(self.initial_cash.is_finite() && self.initial_cash > 0.0) {
            return Err(SwarmtraderError::invalid(
                "backtest",
                "initial_cash",
                format!("must be positive, got {}", self.initial_cash),
            ));
        }
        let commission = self.execution.commission;
        if !(commission.is_finite() && (0.0..1.0).contains(&commission)) {
            return Err(SwarmtraderError::invalid(
                "backtest",
                "commission",
                format!("must be in [0, 1), got {}", commission),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("buy"),
            Side::Sell => f.write_str("sell"),
        }
    }
}

/// A filled order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub date: NaiveDate,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub commission: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initialized,
    Running,
    Completed,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub portfolio: Portfolio,
    pub orders: Vec<OrderRecord>,
    pub skipped_orders: usize,
    pub metrics: Metrics,
}

impl BacktestResult {
    pub fn initial_value(&self) -> f64 {
        self.portfolio.initial_capital
    }

    pub fn final_value(&self) -> f64 {
        self.portfolio.final_equity()
    }

    pub fn buys(&self) -> usize {
        self.orders.iter().filter(|o| o.side == Side::Buy).count()
    }

    pub fn sells(&self) -> usize {
        self.orders.iter().filter(|o| o.side == Side::Sell).count()
    }

    /// (final - initial) / initial
    pub fn total_return(&self) -> f64 {
        (self.final_value() - self.initial_value()) / self.initial_value()
    }

    pub fn equity_series(&self) -> Vec<(NaiveDate, f64)> {
        self.portfolio
            .equity_curve
            .iter()
            .map(|p| (p.date, p.equity))
            .collect()
    }
}

/// One run in progress. Owns its portfolio; dropped when finished.
struct Run<'a> {
    series: &'a PriceSeries,
    config: &'a BacktestConfig,
    state: RunState,
    portfolio: Portfolio,
    pending: Option<Decision>,
    orders: Vec<OrderRecord>,
    skipped_orders: usize,
}

impl<'a> Run<'a> {
    fn new(series: &'a PriceSeries, config: &'a BacktestConfig) -> Self {
        Self {
            series,
            config,
            state: RunState::Initialized,
            portfolio: Portfolio::new(config.initial_cash),
            pending: None,
            orders: Vec::new(),
            skipped_orders: 0,
        }
    }

    fn execute(&mut self, decision: Decision, price: f64, date: NaiveDate) {
        match decision {
            Decision::Hold => {}
            Decision::Buy => {
                match enter_long(&mut self.portfolio, price, date, &self.config.execution) {
                    EntryResult::Entered {
                        quantity,
                        execution_price,
                        commission,
                        ..
                    } => self.orders.push(OrderRecord {
                        date,
                        side: Side::Buy,
                        price: execution_price,
                        quantity,
                        commission,
                    }),
                    EntryResult::InsufficientCash => {
                        debug!(
                            %date,
                            cash = self.portfolio.cash,
                            price,
                            "buy skipped: insufficient cash"
                        );
                        self.skipped_orders += 1;
                    }
                    EntryResult::AlreadyOpen => {
                        debug!(%date, "buy skipped: position already open");
                        self.skipped_orders += 1;
                    }
                }
            }
            Decision::Sell => {
                match exit_long(&mut self.portfolio, price, date, &self.config.execution) {
                    Some(exit) => self.orders.push(OrderRecord {
                        date,
                        side: Side::Sell,
                        price: exit.exit_price,
                        quantity: exit.quantity,
                        commission: exit.exit_commission,
                    }),
                    None => {
                        debug!(%date, "sell skipped: no position");
                        self.skipped_orders += 1;
                    }
                }
            }
        }
    }

    fn step(&mut self, strategy: &mut dyn Strategy, index: usize) {
        let series = self.series;
        let bars = series.bars();
        let bar = &bars[index];

        if let Some(decision) = self.pending.take() {
            self.execute(decision, bar.open, bar.date);
        }

        let view = MarketView {
            history: &bars[..=index],
            current: bar,
            has_position: self.portfolio.has_position(),
        };
        let decision = strategy.decide(&view);

        match self.config.fill {
            FillPrice::Close => self.execute(decision, bar.close, bar.date),
            FillPrice::NextOpen if decision != Decision::Hold => self.pending = Some(decision),
            FillPrice::NextOpen => {}
        }

        let equity = self.portfolio.total_equity(bar.close);
        self.portfolio.record_equity(bar.date, equity);
    }

    fn finish(mut self, strategy_name: String) -> BacktestResult {
        if let Some(decision) = self.pending.take() {
            debug!(?decision, "order pending at end of data dropped");
        }
        self.state = RunState::Completed;
        let metrics = Metrics::compute(&self.portfolio, self.config.risk_free_rate);
        BacktestResult {
            strategy_name,
            portfolio: self.portfolio,
            orders: self.orders,
            skipped_orders: self.skipped_orders,
            metrics,
        }
    }
}

/// Run `strategy` over every bar of `series`.
pub fn run_backtest(
    series: &PriceSeries,
    strategy: &mut dyn Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, SwarmtraderError> {
    config.validate()?;
    if series.is_empty() {
        return Err(SwarmtraderError::EmptySeries);
    }

    let mut run = Run::new(series, config);
    debug_assert_eq!(run.state, RunState::Initialized);
    run.state = RunState::Running;

    for index in 0..series.len() {
        run.step(strategy, index);
    }

    let result = run.finish(strategy.name().to_string());
    debug!(
        strategy = %result.strategy_name,
        from = %series.first_date(),
        to = %series.last_date(),
        buys = result.buys(),
        sells = result.sells(),
        final_value = result.final_value(),
        "backtest finished"
    );
    Ok(result)
}
