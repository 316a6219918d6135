//! Chandelier Runner: data providers, run configuration and orchestration.
//!
//! This crate builds on `chandelier-core` to provide:
//! - CSV and synthetic data providers
//! - TOML run configuration with deterministic run ids
//! - Single-symbol backtest, entry check and regime analysis
//! - Parallel batch backtests and entry screening (rayon)
//! - JSON and CSV export of run results

pub mod batch;
pub mod config;
pub mod data;
pub mod export;
pub mod runner;

pub use batch::{run_batch, screen_entries, BatchReport, ScreenReport, SkippedSymbol};
pub use config::{ConfigError, RunConfig, RunId};
pub use data::{CsvProvider, SyntheticProvider};
pub use export::{
    export_json, export_snapshot_csv, export_tail_csv, export_trades_csv, import_json,
    load_artifacts, save_artifacts, DEFAULT_TAIL_ROWS,
};
pub use runner::{
    analyze_symbol, check_symbol, run_on_bars, run_symbol, DateWindow, RunError, RunResult,
    SCHEMA_VERSION,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn run_result_is_send_sync() {
        assert_send::<RunResult>();
        assert_sync::<RunResult>();
    }

    #[test]
    fn reports_are_send_sync() {
        assert_send::<BatchReport>();
        assert_sync::<BatchReport>();
        assert_send::<ScreenReport>();
        assert_sync::<ScreenReport>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
    }

    #[test]
    fn providers_are_send_sync() {
        assert_send::<CsvProvider>();
        assert_sync::<CsvProvider>();
        assert_send::<SyntheticProvider>();
        assert_sync::<SyntheticProvider>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<DateWindow>();
        assert_sync::<DateWindow>();
    }
}
