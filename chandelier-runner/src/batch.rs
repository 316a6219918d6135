//! Multi-symbol runs: batch backtests and entry screening.
//!
//! Symbols are independent, so both run across rayon's pool. Each symbol's
//! own recurrence stays sequential. A symbol whose data or engine stage
//! fails is skipped with a warning and listed in `skipped`; the rest of the
//! batch still completes. Output order follows input order.

use chandelier_core::data::DataProvider;
use chandelier_core::{EntryCheck, StrategyConfig};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::runner::{check_symbol, run_symbol, DateWindow, RunError, RunResult};

/// A symbol that produced no result, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Outcome of a batch backtest.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<RunResult>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Outcome of an entry screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenReport {
    /// Every symbol that could be checked, entry or not.
    pub checks: Vec<EntryCheck>,
    pub skipped: Vec<SkippedSymbol>,
}

impl ScreenReport {
    /// Symbols whose latest bar is a Buy.
    pub fn entries(&self) -> impl Iterator<Item = &EntryCheck> {
        self.checks.iter().filter(|c| c.is_entry())
    }

    pub fn entry_count(&self) -> usize {
        self.entries().count()
    }
}

fn partition<T>(outcomes: Vec<(String, Result<T, RunError>)>) -> (Vec<T>, Vec<SkippedSymbol>) {
    let mut ok = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(value) => ok.push(value),
            Err(err) => {
                log::warn!("skipping {symbol}: {err}");
                skipped.push(SkippedSymbol {
                    symbol,
                    reason: err.to_string(),
                });
            }
        }
    }
    (ok, skipped)
}

/// Backtest every symbol in parallel.
pub fn run_batch(
    provider: &dyn DataProvider,
    symbols: &[String],
    window: DateWindow,
    config: &StrategyConfig,
) -> BatchReport {
    let outcomes: Vec<_> = symbols
        .par_iter()
        .map(|symbol| (symbol.clone(), run_symbol(provider, symbol, window, config)))
        .collect();
    let (results, skipped) = partition(outcomes);
    log::info!(
        "batch: {} of {} symbols completed, {} skipped",
        results.len(),
        symbols.len(),
        skipped.len()
    );
    BatchReport { results, skipped }
}

/// Entry check for every symbol in parallel.
///
/// A symbol with fewer than `length + 1` bars up to `window.end` (for
/// example, not yet listed) is skipped.
pub fn screen_entries(
    provider: &dyn DataProvider,
    symbols: &[String],
    window: DateWindow,
    config: &StrategyConfig,
) -> ScreenReport {
    let outcomes: Vec<_> = symbols
        .par_iter()
        .map(|symbol| (symbol.clone(), check_symbol(provider, symbol, window, config)))
        .collect();
    let (checks, skipped) = partition(outcomes);
    let report = ScreenReport { checks, skipped };
    log::info!(
        "screen: {} entries among {} checked symbols, {} skipped",
        report.entry_count(),
        report.checks.len(),
        report.skipped.len()
    );
    report
}
