//! Engine configuration values.
//!
//! Every entry point takes one of these explicitly; there is no process-wide
//! settings object. All types deserialize with defaults so a partial TOML or
//! JSON document fills in the rest.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
pub use crate::indicators::Smoothing;

/// Initial direction on the first bar with a defined Chandelier state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionSeed {
    /// Start short: the first upward crossing is a genuine -1 → +1 transition.
    #[default]
    Short,
    /// Start long.
    Long,
    /// +1 iff close >= midpoint of the raw long and short stops.
    Midpoint,
}

/// Parameters of the volatility estimator and Chandelier state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChandelierParams {
    pub length: usize,
    pub multiplier: f64,
    /// Extremes over close (true) or over high/low (false).
    pub use_close: bool,
    pub smoothing: Smoothing,
    pub direction_seed: DirectionSeed,
}

impl Default for ChandelierParams {
    fn default() -> Self {
        Self {
            length: 14,
            multiplier: 2.0,
            use_close: true,
            smoothing: Smoothing::Sma,
            direction_seed: DirectionSeed::Short,
        }
    }
}

impl ChandelierParams {
    pub fn validate(&self) -> EngineResult<()> {
        if self.length == 0 {
            return Err(EngineError::InvalidParameter(
                "length must be >= 1".into(),
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "multiplier must be finite and non-negative, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }

    /// Fewest bars the engine accepts: one full window plus one prior bar.
    pub fn min_bars(&self) -> usize {
        self.length + 1
    }
}

/// Buy-side trend filter: close must sit above SMA(close, period).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendFilter {
    pub period: usize,
}

impl Default for TrendFilter {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl TrendFilter {
    pub fn validate(&self) -> EngineResult<()> {
        if self.period == 0 {
            return Err(EngineError::InvalidParameter(
                "trend filter period must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Simulator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestParams {
    pub initial_capital: f64,
    /// Fraction charged on each leg, e.g. 0.001 = 0.1%.
    pub commission_rate: f64,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            initial_capital: 20_000.0,
            commission_rate: 0.001,
        }
    }
}

impl BacktestParams {
    pub fn validate(&self) -> EngineResult<()> {
        if !self.initial_capital.is_finite() || self.initial_capital < 0.0 {
            return Err(EngineError::InvalidParameter(format!(
                "initial capital must be finite and non-negative, got {}",
                self.initial_capital
            )));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(EngineError::InvalidParameter(format!(
                "commission rate must be in [0, 1), got {}",
                self.commission_rate
            )));
        }
        Ok(())
    }
}

/// Everything one pipeline run needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub chandelier: ChandelierParams,
    pub trend_filter: Option<TrendFilter>,
    pub backtest: BacktestParams,
}

impl StrategyConfig {
    /// Configuration used for entry screening: default engine with the
    /// 20-day trend filter switched on.
    pub fn screening() -> Self {
        Self {
            trend_filter: Some(TrendFilter::default()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.chandelier.validate()?;
        if let Some(filter) = &self.trend_filter {
            filter.validate()?;
        }
        self.backtest.validate()
    }
}
