//! Chandelier Exit state machine.
//!
//! Per bar i >= length-1:
//! 1. highest/lowest over the last `length` closes (or highs/lows)
//! 2. raw_long = highest - mult * ATR, raw_short = lowest + mult * ATR
//! 3. long_stop ratchets up only while the previous close held above it;
//!    short_stop ratchets down only while the previous close held below it
//! 4. direction flips to +1 when close breaks above the previous short stop,
//!    to -1 when it breaks below the previous long stop, else carries over
//! 5. exit_level is the stop on the active side
//!
//! Steps 3 and 4 read the previous bar's state, so the series is computed as
//! one sequential scan. Bars before the first defined one carry no state.

use std::collections::VecDeque;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{ChandelierParams, DirectionSeed};
use crate::domain::{Bar, Direction};
use crate::error::{require_bars, EngineError, EngineResult};
use crate::indicators::{average_true_range, VolatilitySeries};

/// Engine output for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChandelierState {
    pub highest: f64,
    pub lowest: f64,
    pub atr: f64,
    pub long_stop: f64,
    pub short_stop: f64,
    pub direction: Direction,
    pub exit_level: f64,
}

/// Volatility input plus one optional state per bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChandelierSeries {
    pub volatility: VolatilitySeries,
    pub states: Vec<Option<ChandelierState>>,
}

impl ChandelierSeries {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Index of the first bar carrying a state.
    pub fn first_defined(&self) -> Option<usize> {
        self.states.iter().position(Option::is_some)
    }

    pub fn latest(&self) -> Option<&ChandelierState> {
        self.states.last().and_then(Option::as_ref)
    }

    pub fn directions(&self) -> Vec<Option<Direction>> {
        self.states.iter().map(|s| s.map(|s| s.direction)).collect()
    }
}

/// Compute ATR and the Chandelier state sequence in one call.
pub fn compute_chandelier_exit(
    bars: &[Bar],
    params: &ChandelierParams,
) -> EngineResult<ChandelierSeries> {
    params.validate()?;
    require_bars(params.min_bars(), bars.len())?;
    let volatility = average_true_range(bars, params.length, params.smoothing)?;
    let states = chandelier_states(bars, &volatility, params)?;
    Ok(ChandelierSeries { volatility, states })
}

/// Run the state machine over a precomputed volatility series.
pub fn chandelier_states(
    bars: &[Bar],
    volatility: &VolatilitySeries,
    params: &ChandelierParams,
) -> EngineResult<Vec<Option<ChandelierState>>> {
    params.validate()?;
    if volatility.len() != bars.len() {
        return Err(EngineError::InvalidParameter(format!(
            "volatility series has {} entries for {} bars",
            volatility.len(),
            bars.len()
        )));
    }
    require_bars(params.min_bars(), bars.len())?;

    let warmup = params.length - 1;
    let mut window = RollingExtremes::new(params.length);
    let mut states = Vec::with_capacity(bars.len());
    let mut prev: Option<ChandelierState> = None;

    for (i, bar) in bars.iter().enumerate() {
        window.push(i, bar.upper(params.use_close), bar.lower(params.use_close));
        if i < warmup {
            states.push(None);
            continue;
        }

        let atr = volatility.atr_at(i).ok_or_else(|| {
            EngineError::InvalidParameter(format!("ATR undefined at bar {i} past warmup"))
        })?;
        let (highest, lowest) = window.extremes();
        let raw_long = highest - params.multiplier * atr;
        let raw_short = lowest + params.multiplier * atr;

        let (long_stop, short_stop, direction) = match prev {
            None => (
                raw_long,
                raw_short,
                seed_direction(params.direction_seed, bar.close, raw_long, raw_short),
            ),
            Some(p) => {
                let prev_close = bars[i - 1].close;
                let long_stop = if prev_close > p.long_stop && raw_long > p.long_stop {
                    raw_long
                } else {
                    p.long_stop
                };
                let short_stop = if prev_close < p.short_stop && raw_short < p.short_stop {
                    raw_short
                } else {
                    p.short_stop
                };
                let direction = if bar.close > p.short_stop {
                    Direction::Long
                } else if bar.close < p.long_stop {
                    Direction::Short
                } else {
                    p.direction
                };
                if direction != p.direction {
                    debug!(
                        "{} {}: direction {} -> {} at close {:.4}",
                        bar.symbol, bar.date, p.direction, direction, bar.close
                    );
                }
                (long_stop, short_stop, direction)
            }
        };

        let exit_level = match direction {
            Direction::Long => long_stop,
            Direction::Short => short_stop,
        };
        let state = ChandelierState {
            highest,
            lowest,
            atr,
            long_stop,
            short_stop,
            direction,
            exit_level,
        };
        states.push(Some(state));
        prev = Some(state);
    }

    Ok(states)
}

fn seed_direction(seed: DirectionSeed, close: f64, raw_long: f64, raw_short: f64) -> Direction {
    match seed {
        DirectionSeed::Short => Direction::Short,
        DirectionSeed::Long => Direction::Long,
        DirectionSeed::Midpoint => {
            if close >= (raw_long + raw_short) / 2.0 {
                Direction::Long
            } else {
                Direction::Short
            }
        }
    }
}

/// Rolling max of the upper source and min of the lower source over a
/// fixed window, using monotone deques of (index, value).
struct RollingExtremes {
    length: usize,
    maxima: VecDeque<(usize, f64)>,
    minima: VecDeque<(usize, f64)>,
}

impl RollingExtremes {
    fn new(length: usize) -> Self {
        Self {
            length,
            maxima: VecDeque::with_capacity(length),
            minima: VecDeque::with_capacity(length),
        }
    }

    fn push(&mut self, index: usize, upper: f64, lower: f64) {
        while self.maxima.back().is_some_and(|&(_, v)| v <= upper) {
            self.maxima.pop_back();
        }
        self.maxima.push_back((index, upper));
        while self.minima.back().is_some_and(|&(_, v)| v >= lower) {
            self.minima.pop_back();
        }
        self.minima.push_back((index, lower));

        let oldest = (index + 1).saturating_sub(self.length);
        while self.maxima.front().is_some_and(|&(j, _)| j < oldest) {
            self.maxima.pop_front();
        }
        while self.minima.front().is_some_and(|&(j, _)| j < oldest) {
            self.minima.pop_front();
        }
    }

    fn extremes(&self) -> (f64, f64) {
        let highest = self.maxima.front().map_or(f64::NAN, |&(_, v)| v);
        let lowest = self.minima.front().map_or(f64::NAN, |&(_, v)| v);
        (highest, lowest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Smoothing;
    use crate::indicators::{assert_approx, make_bars, make_ohlc_bars};

    fn params(length: usize, multiplier: f64) -> ChandelierParams {
        ChandelierParams {
            length,
            multiplier,
            ..Default::default()
        }
    }

    /// Closes rising linearly from 10 to 20 over 30 bars, high/low = close ± 0.5.
    fn rising_bars() -> Vec<Bar> {
        let data: Vec<_> = (0..30)
            .map(|i| {
                let c = 10.0 + 10.0 * i as f64 / 29.0;
                (c, c + 0.5, c - 0.5, c)
            })
            .collect();
        make_ohlc_bars(&data)
    }

    #[test]
    fn warmup_bars_carry_no_state() {
        let series = compute_chandelier_exit(&rising_bars(), &params(14, 2.0)).unwrap();
        assert_eq!(series.len(), 30);
        assert!(series.states[..13].iter().all(Option::is_none));
        assert!(series.states[13..].iter().all(Option::is_some));
        assert_eq!(series.first_defined(), Some(13));
    }

    #[test]
    fn first_defined_bar_uses_raw_stops_and_seed() {
        let bars = rising_bars();
        let series = compute_chandelier_exit(&bars, &params(14, 2.0)).unwrap();
        let s = series.states[13].unwrap();
        // TR is 1.0 on every bar, so ATR = 1.
        assert_approx(s.atr, 1.0, 1e-12);
        assert_approx(s.highest, bars[13].close, 1e-12);
        assert_approx(s.lowest, 10.0, 1e-12);
        assert_approx(s.long_stop, bars[13].close - 2.0, 1e-12);
        assert_approx(s.short_stop, 12.0, 1e-12);
        assert_eq!(s.direction, Direction::Short);
        assert_eq!(s.exit_level, s.short_stop);
    }

    #[test]
    fn rising_series_flips_long_once() {
        let series = compute_chandelier_exit(&rising_bars(), &params(14, 2.0)).unwrap();
        let dirs: Vec<Direction> = series.states.iter().flatten().map(|s| s.direction).collect();
        let flips = dirs.windows(2).filter(|w| w[0] != w[1]).count();
        assert_eq!(flips, 1);
        assert_eq!(series.states[14].unwrap().direction, Direction::Long);
        assert_eq!(series.latest().unwrap().direction, Direction::Long);
    }

    #[test]
    fn flat_line_collapses_band() {
        let bars = make_ohlc_bars(&[(10.0, 10.0, 10.0, 10.0); 28]);
        let series = compute_chandelier_exit(&bars, &params(14, 2.0)).unwrap();
        for s in series.states.iter().flatten() {
            assert_eq!(s.atr, 0.0);
            assert_eq!(s.long_stop, 10.0);
            assert_eq!(s.short_stop, 10.0);
            assert_eq!(s.direction, Direction::Short);
        }
    }

    #[test]
    fn long_stop_holds_when_raw_would_loosen() {
        // Rise then a sharp drop: the raw long stop falls, the ratcheted one must not.
        let mut closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        closes.extend([108.0, 107.5, 107.0]);
        let bars = make_bars(&closes);
        let series = compute_chandelier_exit(&bars, &params(3, 1.0)).unwrap();
        let states: Vec<_> = series.states.iter().flatten().collect();
        for pair in states.windows(2) {
            assert!(pair[1].long_stop >= pair[0].long_stop);
        }
    }

    #[test]
    fn exit_level_tracks_active_side() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + 8.0 * (i as f64 * 0.25).sin())
            .collect();
        let series = compute_chandelier_exit(&make_bars(&closes), &params(5, 1.5)).unwrap();
        for s in series.states.iter().flatten() {
            let expected = if s.direction.is_long() { s.long_stop } else { s.short_stop };
            assert_eq!(s.exit_level, expected);
        }
    }

    #[test]
    fn high_low_envelope_option() {
        let bars = rising_bars();
        let p = ChandelierParams {
            use_close: false,
            ..params(14, 2.0)
        };
        let s = compute_chandelier_exit(&bars, &p).unwrap().states[13].unwrap();
        assert_approx(s.highest, bars[13].high, 1e-12);
        assert_approx(s.lowest, bars[0].low, 1e-12);
    }

    #[test]
    fn seed_policies() {
        let bars = rising_bars();
        let long = ChandelierParams {
            direction_seed: DirectionSeed::Long,
            ..params(14, 2.0)
        };
        let series = compute_chandelier_exit(&bars, &long).unwrap();
        assert!(series.states.iter().flatten().all(|s| s.direction.is_long()));

        // close[13] ≈ 14.48 sits above the midpoint of 12.48 and 12.
        let mid = ChandelierParams {
            direction_seed: DirectionSeed::Midpoint,
            ..params(14, 2.0)
        };
        let s = compute_chandelier_exit(&bars, &mid).unwrap().states[13].unwrap();
        assert_eq!(s.direction, Direction::Long);
    }

    #[test]
    fn wilder_smoothing_is_threaded_through() {
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.4).cos() * 3.0).collect();
        let bars = make_bars(&closes);
        let p = ChandelierParams {
            smoothing: Smoothing::Wilder,
            ..params(10, 3.0)
        };
        let series = compute_chandelier_exit(&bars, &p).unwrap();
        assert_eq!(series.volatility.smoothing, Smoothing::Wilder);
        for (i, s) in series.states.iter().enumerate() {
            if let Some(s) = s {
                assert_eq!(Some(s.atr), series.volatility.atr[i]);
            }
        }
    }

    #[test]
    fn too_few_bars_is_insufficient_data() {
        let bars = make_bars(&[10.0; 14]);
        assert_eq!(
            compute_chandelier_exit(&bars, &params(14, 2.0)),
            Err(EngineError::InsufficientData {
                required: 15,
                available: 14
            })
        );
        assert!(compute_chandelier_exit(&make_bars(&[10.0; 15]), &params(14, 2.0)).is_ok());
    }

    #[test]
    fn mismatched_volatility_is_rejected() {
        let bars = make_bars(&[10.0; 20]);
        let vol = average_true_range(&bars[..19], 5, Smoothing::Sma).unwrap();
        assert!(matches!(
            chandelier_states(&bars, &vol, &params(5, 2.0)),
            Err(EngineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rolling_extremes_match_naive_scan() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0];
        let mut window = RollingExtremes::new(3);
        for (i, &v) in values.iter().enumerate() {
            window.push(i, v, v);
            let lo = i.saturating_sub(2);
            let slice = &values[lo..=i];
            let max = slice.iter().cloned().fold(f64::MIN, f64::max);
            let min = slice.iter().cloned().fold(f64::MAX, f64::min);
            assert_eq!(window.extremes(), (max, min), "at {i}");
        }
    }
}
