//! Single-symbol runner: provider → pipeline → result.
//!
//! Entry points:
//! - `run_symbol()`: full backtest with fingerprint. Used by `backtest`.
//! - `check_symbol()`: entry check on the latest bar. Used by `screen`/`check`.
//! - `analyze_symbol()`: market regime report. Used by `analyze`.

use chandelier_core::data::{DataError, DataProvider, DataSource};
use chandelier_core::fingerprint::RunFingerprint;
use chandelier_core::{
    analyze_regime, check_entry, run_pipeline, Bar, EngineError, EntryCheck, PipelineOutput,
    RegimeParams, RegimeReport, StrategyConfig,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("engine error for '{symbol}': {source}")]
    Engine {
        symbol: String,
        #[source]
        source: EngineError,
    },
}

impl RunError {
    fn engine(symbol: &str) -> impl FnOnce(EngineError) -> RunError + '_ {
        move |source| RunError::Engine {
            symbol: symbol.to_string(),
            source,
        }
    }
}

/// Inclusive date window requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        if start > end {
            return Err(ConfigError::Invalid(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one symbol's backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub source: DataSource,
    pub config: StrategyConfig,
    pub fingerprint: RunFingerprint,
    pub bars: Vec<Bar>,
    pub output: PipelineOutput,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunResult {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

fn fetch(
    provider: &dyn DataProvider,
    symbol: &str,
    window: DateWindow,
) -> Result<Vec<Bar>, RunError> {
    let bars = provider.fetch_daily_bars(symbol, window.start, window.end)?;
    log::debug!(
        "{symbol}: {} bars from {} ({} to {})",
        bars.len(),
        provider.name(),
        window.start,
        window.end
    );
    Ok(bars)
}

/// Fetch bars and run the full pipeline for one symbol.
pub fn run_symbol(
    provider: &dyn DataProvider,
    symbol: &str,
    window: DateWindow,
    config: &StrategyConfig,
) -> Result<RunResult, RunError> {
    let bars = fetch(provider, symbol, window)?;
    run_on_bars(symbol, bars, provider.source(), config)
}

/// Run the full pipeline on already-loaded bars. No I/O.
pub fn run_on_bars(
    symbol: &str,
    bars: Vec<Bar>,
    source: DataSource,
    config: &StrategyConfig,
) -> Result<RunResult, RunError> {
    let output = run_pipeline(&bars, config).map_err(RunError::engine(symbol))?;
    let fingerprint = RunFingerprint::new(symbol, &bars, config).map_err(RunError::engine(symbol))?;

    log::info!(
        "{symbol}: run {}: {} trades, total return {:.2}%",
        fingerprint.short_id(),
        output.backtest.trades.len(),
        output.performance.total_return * 100.0
    );

    Ok(RunResult {
        schema_version: SCHEMA_VERSION,
        symbol: symbol.to_string(),
        source,
        config: config.clone(),
        fingerprint,
        bars,
        output,
    })
}

/// Entry check on the last bar at or before `window.end`.
pub fn check_symbol(
    provider: &dyn DataProvider,
    symbol: &str,
    window: DateWindow,
    config: &StrategyConfig,
) -> Result<EntryCheck, RunError> {
    let bars = fetch(provider, symbol, window)?;
    check_entry(&bars, Some(window.end), config).map_err(RunError::engine(symbol))
}

/// Market regime classification on the latest bar.
pub fn analyze_symbol(
    provider: &dyn DataProvider,
    symbol: &str,
    window: DateWindow,
    params: &RegimeParams,
) -> Result<RegimeReport, RunError> {
    let bars = fetch(provider, symbol, window)?;
    analyze_regime(&bars, params).map_err(RunError::engine(symbol))
}
