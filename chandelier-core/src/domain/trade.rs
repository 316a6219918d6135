//! Closed trade records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A completed round trip: one entry matched with one exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub shares: u64,
    /// Price return `exit / entry - 1`, commission excluded.
    pub return_pct: f64,
    /// Net of commission on both legs.
    pub profit: f64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }

    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winner_and_holding_period() {
        let trade = TradeRecord {
            entry_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            entry_price: 10.0,
            exit_date: NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            exit_price: 11.0,
            shares: 100,
            return_pct: 0.1,
            profit: 97.9,
        };
        assert!(trade.is_winner());
        assert_eq!(trade.holding_days(), 10);
    }
}
