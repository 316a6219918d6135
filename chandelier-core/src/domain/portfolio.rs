//! Per-bar ledger snapshot and the open-position slot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ledger state after processing one bar.
///
/// `portfolio_value == cash + holdings_value` on every bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub date: NaiveDate,
    pub position_size: u64,
    pub cash: f64,
    pub holdings_value: f64,
    pub portfolio_value: f64,
}

impl PortfolioState {
    pub fn is_flat(&self) -> bool {
        self.position_size == 0
    }
}

/// The single open entry while the simulator is long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub shares: u64,
    /// Cash paid including commission.
    pub entry_cost: f64,
}

impl OpenPosition {
    /// Mark-to-market value at `price`, before exit commission.
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }
}
