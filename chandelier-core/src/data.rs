//! Data provider trait and structured error types.
//!
//! The engine never performs I/O; providers hand it an in-memory, ascending,
//! forward-adjusted bar series. Implementations live in the runner crate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

/// Errors from data providers. Propagated unchanged through the runner.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data for '{symbol}' between {start} and {end}")]
    DataUnavailable {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("malformed data for '{symbol}': {reason}")]
    Malformed { symbol: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    CsvImport,
    Synthetic,
}

/// Source of daily bars.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Daily bars for `symbol` with `start <= date <= end`, ascending.
    ///
    /// An empty result is reported as `DataError::DataUnavailable`.
    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError>;
}

/// Sort ascending, keep `start..=end`, and turn an empty result into
/// `DataUnavailable`. Shared by provider implementations.
pub fn finalize_range(
    symbol: &str,
    mut bars: Vec<Bar>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Bar>, DataError> {
    bars.retain(|b| b.date >= start && b.date <= end);
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    if bars.is_empty() {
        return Err(DataError::DataUnavailable {
            symbol: symbol.to_string(),
            start,
            end,
        });
    }
    Ok(bars)
}
