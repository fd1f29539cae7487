//! Portfolio state and equity tracking for a single instrument.
//!
//! A `Portfolio` belongs to exactly one backtest run and is dropped with it.

use chrono::NaiveDate;

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn open(&mut self, position: Position) {
        self.position = Some(position);
    }

    pub fn take_position(&mut self) -> Option<Position> {
        self.position.take()
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }

    pub fn total_equity(&self, price: f64) -> f64 {
        let position_value = self
            .position
            .as_ref()
            .map(|pos| pos.market_value(price))
            .unwrap_or(0.0);
        self.cash + position_value
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_capital)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn sample_position(quantity: f64) -> Position {
        Position {
            quantity,
            entry_price: 100.0,
            entry_date: date(),
            entry_commission: 0.0,
        }
    }

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new(6000.0);
        assert!((portfolio.cash - 6000.0).abs() < f64::EPSILON);
        assert!(!portfolio.has_position());
        assert!(portfolio.closed_trades.is_empty());
        assert!(portfolio.equity_curve.is_empty());
    }

    #[test]
    fn open_and_take_position() {
        let mut portfolio = Portfolio::new(6000.0);
        portfolio.open(sample_position(10.0));
        assert!(portfolio.has_position());

        let taken = portfolio.take_position();
        assert_eq!(taken.map(|p| p.quantity), Some(10.0));
        assert!(!portfolio.has_position());
        assert!(portfolio.take_position().is_none());
    }

    #[test]
    fn total_equity_without_position_is_cash() {
        let portfolio = Portfolio::new(6000.0);
        assert!((portfolio.total_equity(123.0) - 6000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn total_equity_marks_position_to_price() {
        let mut portfolio = Portfolio::new(6000.0);
        portfolio.open(sample_position(50.0));
        portfolio.cash = 1000.0;
        assert!((portfolio.total_equity(110.0) - 6500.0).abs() < 1e-9);
    }

    #[test]
    fn final_equity_falls_back_to_initial() {
        let mut portfolio = Portfolio::new(6000.0);
        assert!((portfolio.final_equity() - 6000.0).abs() < f64::EPSILON);
        portfolio.record_equity(date(), 6100.0);
        assert!((portfolio.final_equity() - 6100.0).abs() < f64::EPSILON);
    }
}
