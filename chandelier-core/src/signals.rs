//! Buy/Sell/Hold events from direction transitions.
//!
//! Buy on -1 → +1 (and, with a trend filter, close above SMA(close, period));
//! Sell on +1 → -1; Hold otherwise. A bar whose own or previous state is
//! undefined is Hold, and so is a Buy whose filter SMA is still warming up.

use crate::chandelier::ChandelierState;
use crate::config::TrendFilter;
use crate::domain::{Bar, Direction, Signal};
use crate::error::{EngineError, EngineResult};
use crate::indicators::{Indicator, Sma};

/// Signal for one transition, ignoring any filter.
pub fn transition_signal(prev: Option<Direction>, curr: Option<Direction>) -> Signal {
    match (prev, curr) {
        (Some(Direction::Short), Some(Direction::Long)) => Signal::Buy,
        (Some(Direction::Long), Some(Direction::Short)) => Signal::Sell,
        _ => Signal::Hold,
    }
}

/// Derive one signal per bar from the state sequence.
pub fn generate_signals(
    bars: &[Bar],
    states: &[Option<ChandelierState>],
    trend_filter: Option<&TrendFilter>,
) -> EngineResult<Vec<Signal>> {
    if bars.len() != states.len() {
        return Err(EngineError::InvalidParameter(format!(
            "{} states for {} bars",
            states.len(),
            bars.len()
        )));
    }
    let trend = match trend_filter {
        Some(filter) => {
            filter.validate()?;
            Some(Sma::new(filter.period).compute(bars))
        }
        None => None,
    };

    let mut signals = Vec::with_capacity(states.len());
    let mut prev: Option<Direction> = None;
    for (i, state) in states.iter().enumerate() {
        let curr = state.map(|s| s.direction);
        let mut signal = transition_signal(prev, curr);
        if signal == Signal::Buy {
            if let Some(trend) = &trend {
                let above = trend[i].is_some_and(|ma| bars[i].close > ma);
                if !above {
                    signal = Signal::Hold;
                }
            }
        }
        signals.push(signal);
        prev = curr;
    }
    Ok(signals)
}

/// Number of bars carrying `signal`.
pub fn count_signals(signals: &[Signal], signal: Signal) -> usize {
    signals.iter().filter(|&&s| s == signal).count()
}
