//! Engine error taxonomy.
//!
//! Indicator-stage errors abort the whole per-symbol pipeline. Simulator
//! no-ops (a Buy while already long, a Sell while flat) are not errors; the
//! backtest logs and counts them instead.

use thiserror::Error;

/// Errors raised by the engine stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("insufficient data: need at least {required} bars, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("degenerate statistic: {0}")]
    DegenerateStatistic(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Fail with `InsufficientData` unless `available >= required`.
pub(crate) fn require_bars(required: usize, available: usize) -> EngineResult<()> {
    if available < required {
        return Err(EngineError::InsufficientData {
            required,
            available,
        });
    }
    Ok(())
}
