//! Order execution against a single-instrument portfolio.
//!
//! Buys spend all available cash on a fractional quantity, sized so that
//! notional plus commission never exceeds cash. Sells close the whole
//! position. Commission is a fraction of notional charged on both sides.

use chrono::NaiveDate;

use super::portfolio::Portfolio;
use super::position::{ClosedTrade, Position};

/// Execution parameters for one backtest run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    /// Fraction of notional, e.g. 0.001 for 0.1%.
    pub commission: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig { commission: 0.0 }
    }
}

/// commission * notional
pub fn calculate_commission(notional: f64, config: &ExecutionConfig) -> f64 {
    notional * config.commission
}

/// Largest quantity whose notional plus commission fits in `cash`.
pub fn affordable_quantity(cash: f64, price: f64, config: &ExecutionConfig) -> f64 {
    if cash <= 0.0 || price <= 0.0 || !price.is_finite() {
        return 0.0;
    }
    cash / (price * (1.0 + config.commission))
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        quantity: f64,
        execution_price: f64,
        cost: f64,
        commission: f64,
    },
    InsufficientCash,
    AlreadyOpen,
}

/// Enter a long position with all available cash.
pub fn enter_long(
    portfolio: &mut Portfolio,
    price: f64,
    date: NaiveDate,
    config: &ExecutionConfig,
) -> EntryResult {
    if portfolio.has_position() {
        return EntryResult::AlreadyOpen;
    }

    let quantity = affordable_quantity(portfolio.cash, price, config);
    if quantity <= 0.0 {
        return EntryResult::InsufficientCash;
    }

    let cost = quantity * price;
    let commission = calculate_commission(cost, config);
    // cost + commission equals cash up to rounding
    portfolio.cash = (portfolio.cash - cost - commission).max(0.0);

    portfolio.open(Position {
        quantity,
        entry_price: price,
        entry_date: date,
        entry_commission: commission,
    });

    EntryResult::Entered {
        quantity,
        execution_price: price,
        cost,
        commission,
    }
}

/// Result of an exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub quantity: f64,
    pub exit_price: f64,
    pub exit_value: f64,
    pub exit_commission: f64,
    pub pnl: f64,
}

/// Close the open position. Returns `None` when flat.
pub fn exit_long(
    portfolio: &mut Portfolio,
    price: f64,
    exit_date: NaiveDate,
    config: &ExecutionConfig,
) -> Option<ExitResult> {
    let position = portfolio.take_position()?;

    let exit_value = position.quantity * price;
    let exit_commission = calculate_commission(exit_value, config);
    let pnl = position.quantity * (price - position.entry_price)
        - position.entry_commission
        - exit_commission;

    portfolio.cash += exit_value - exit_commission;

    portfolio.record_trade(ClosedTrade {
        quantity: position.quantity,
        entry_price: position.entry_price,
        exit_price: price,
        entry_date: position.entry_date,
        exit_date,
        pnl,
    });

    Some(ExitResult {
        quantity: position.quantity,
        exit_price: price,
        exit_value,
        exit_commission,
        pnl,
    })
}
