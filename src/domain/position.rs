//! Open position and closed trade records.

use chrono::NaiveDate;

/// A long holding. Quantity is fractional: buys spend all available cash.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    pub entry_commission: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity * (price - self.entry_price)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    /// Net of entry and exit commissions.
    pub pnl: f64,
}

impl ClosedTrade {
    pub fn duration_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }

    pub fn return_pct(&self) -> f64 {
        let basis = self.quantity * self.entry_price;
        if basis > 0.0 { self.pnl / basis } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position() -> Position {
        Position {
            quantity: 12.5,
            entry_price: 40.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            entry_commission: 0.5,
        }
    }

    #[test]
    fn market_value_fractional() {
        let pos = sample_position();
        assert!((pos.market_value(44.0) - 550.0).abs() < 1e-12);
    }

    #[test]
    fn unrealized_pnl_profit_and_loss() {
        let pos = sample_position();
        assert!((pos.unrealized_pnl(44.0) - 50.0).abs() < 1e-12);
        assert!((pos.unrealized_pnl(36.0) + 50.0).abs() < 1e-12);
    }

    #[test]
    fn closed_trade_duration_and_return() {
        let trade = ClosedTrade {
            quantity: 10.0,
            entry_price: 50.0,
            exit_price: 55.0,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            exit_date: NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
            pnl: 49.0,
        };
        assert_eq!(trade.duration_days(), 5);
        assert!((trade.return_pct() - 0.098).abs() < 1e-12);
    }
}
