//! Chandelier Core: volatility-based trailing-stop engine and backtester.
//!
//! Data flows strictly downward, each stage consuming an immutable series:
//! - `indicators::atr`: true range and smoothed ATR
//! - `chandelier`: rolling envelopes, ratcheted stops, direction state
//! - `signals`: Buy/Sell/Hold from direction transitions, optional trend filter
//! - `backtest`: single-position ledger and closed trades
//! - `performance`: total return, drawdown, Sharpe-like ratio
//!
//! `pipeline` chains them for one symbol. `regime` classifies the market
//! from independent indicator readings. No I/O happens in this crate.

pub mod backtest;
pub mod chandelier;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod indicators;
pub mod performance;
pub mod pipeline;
pub mod regime;
pub mod signals;

pub use backtest::{run_backtest, BacktestOutcome};
pub use chandelier::{compute_chandelier_exit, ChandelierSeries, ChandelierState};
pub use config::{
    BacktestParams, ChandelierParams, DirectionSeed, Smoothing, StrategyConfig, TrendFilter,
};
pub use domain::{Bar, Direction, OpenPosition, PortfolioState, Signal, TradeRecord};
pub use error::{EngineError, EngineResult};
pub use performance::{summarize_performance, PerformanceSummary, TradeStats};
pub use pipeline::{check_entry, run_pipeline, EntryCheck, PipelineOutput};
pub use regime::{analyze_regime, MarketRegime, RegimeParams, RegimeReport};
pub use signals::generate_signals;
