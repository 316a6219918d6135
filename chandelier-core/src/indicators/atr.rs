//! Average True Range (ATR): the volatility estimator.
//!
//! True Range: TR[0] = high[0] - low[0];
//! TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
//!
//! Smoothing is a named option applied uniformly wherever ATR is used:
//! - `Sma`: rolling mean of TR over `length` bars.
//! - `Wilder`: seeded with the mean of TR[0..length], then
//!   ATR[t] = (ATR[t-1] * (length-1) + TR[t]) / length.
//!
//! Both policies share the same warmup: ATR[t] is `None` for t < length-1.

use serde::{Deserialize, Serialize};

use super::sma::rolling_mean;
use super::Indicator;
use crate::domain::Bar;
use crate::error::{EngineError, EngineResult};

/// Smoothing policy for the true-range series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smoothing {
    #[default]
    Sma,
    Wilder,
}

impl Smoothing {
    /// Smooth an already-computed true-range series.
    pub fn apply(self, true_range: &[f64], length: usize) -> Vec<Option<f64>> {
        match self {
            Smoothing::Sma => rolling_mean(true_range, length),
            Smoothing::Wilder => {
                let values: Vec<Option<f64>> = true_range
                    .iter()
                    .map(|v| if v.is_nan() { None } else { Some(*v) })
                    .collect();
                wilder_smooth(&values, length)
            }
        }
    }
}

/// True range and smoothed ATR, aligned by index with the input bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilitySeries {
    pub length: usize,
    pub smoothing: Smoothing,
    pub true_range: Vec<f64>,
    pub atr: Vec<Option<f64>>,
}

impl VolatilitySeries {
    pub fn len(&self) -> usize {
        self.atr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atr.is_empty()
    }

    /// ATR at bar `i`, `None` during warmup or out of range.
    pub fn atr_at(&self, i: usize) -> Option<f64> {
        self.atr.get(i).copied().flatten()
    }
}

/// Compute TR and smoothed ATR for `bars`.
pub fn average_true_range(
    bars: &[Bar],
    length: usize,
    smoothing: Smoothing,
) -> EngineResult<VolatilitySeries> {
    if length == 0 {
        return Err(EngineError::InvalidParameter(
            "ATR length must be >= 1".into(),
        ));
    }
    let tr = true_range(bars);
    let atr = smoothing.apply(&tr, length);
    Ok(VolatilitySeries {
        length,
        smoothing,
        true_range: tr,
        atr,
    })
}

/// Compute the True Range series from bars.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let range = bar.high - bar.low;
        if i == 0 {
            tr.push(range);
            continue;
        }
        let pc = bars[i - 1].close;
        tr.push(range.max((bar.high - pc).abs()).max((bar.low - pc).abs()));
    }
    tr
}

/// Wilder smoothing of a series with alpha = 1/period.
///
/// Seed: mean of the first `period` consecutive defined values, placed at
/// the last index of that run. A gap after the seed ends the series.
pub fn wilder_smooth(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if period == 0 || n < period {
        return result;
    }

    let mut run = 0;
    let mut seed_end = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_some() {
            run += 1;
            if run == period {
                seed_end = Some(i);
                break;
            }
        } else {
            run = 0;
        }
    }
    let Some(seed_end) = seed_end else {
        return result;
    };

    let seed_sum: f64 = values[seed_end + 1 - period..=seed_end]
        .iter()
        .flatten()
        .sum();
    let mut prev = seed_sum / period as f64;
    result[seed_end] = Some(prev);

    let weight = (period - 1) as f64;
    for i in (seed_end + 1)..n {
        let Some(v) = values[i] else {
            break;
        };
        prev = (prev * weight + v) / period as f64;
        result[i] = Some(prev);
    }
    result
}

/// ATR as a named single-series indicator.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    smoothing: Smoothing,
    name: String,
}

impl Atr {
    pub fn new(period: usize, smoothing: Smoothing) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        let suffix = match smoothing {
            Smoothing::Sma => "",
            Smoothing::Wilder => "_wilder",
        };
        Self {
            period,
            smoothing,
            name: format!("atr_{period}{suffix}"),
        }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        self.smoothing.apply(&true_range(bars), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    fn sample_bars() -> Vec<Bar> {
        make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = max(8, 6, 2) = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = max(9, 1, 8) = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = max(6, 4, 2) = 6
            (101.0, 106.0, 100.0, 105.0), // TR = max(6, 5, 1) = 6
        ])
    }

    #[test]
    fn true_range_basic() {
        let tr = true_range(&sample_bars());
        assert_eq!(tr, vec![10.0, 8.0, 9.0, 6.0, 6.0]);
    }

    #[test]
    fn true_range_uses_all_three_legs() {
        // Gap up: the |high - prev_close| leg dominates.
        let bars = make_ohlc_bars(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0),
        ]);
        assert_approx(true_range(&bars)[1], 15.0, DEFAULT_EPSILON);

        // Gap down: the |low - prev_close| leg dominates.
        let bars = make_ohlc_bars(&[
            (98.0, 102.0, 97.0, 100.0),
            (90.0, 92.0, 85.0, 88.0),
        ]);
        assert_approx(true_range(&bars)[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_smoothing_period_3() {
        let vol = average_true_range(&sample_bars(), 3, Smoothing::Sma).unwrap();
        assert!(vol.atr[0].is_none());
        assert!(vol.atr[1].is_none());
        assert_approx(vol.atr[2].unwrap(), 9.0, DEFAULT_EPSILON);
        assert_approx(vol.atr[3].unwrap(), 23.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(vol.atr[4].unwrap(), 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_smoothing_period_3() {
        let vol = average_true_range(&sample_bars(), 3, Smoothing::Wilder).unwrap();
        assert!(vol.atr[1].is_none());
        // Seed = mean(10, 8, 9) = 9; then (9*2 + 6)/3 = 8; then (8*2 + 6)/3 = 22/3.
        assert_approx(vol.atr[2].unwrap(), 9.0, DEFAULT_EPSILON);
        assert_approx(vol.atr[3].unwrap(), 8.0, DEFAULT_EPSILON);
        assert_approx(vol.atr[4].unwrap(), 22.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn both_policies_share_warmup() {
        let bars = sample_bars();
        for smoothing in [Smoothing::Sma, Smoothing::Wilder] {
            let vol = average_true_range(&bars, 4, smoothing).unwrap();
            let first = vol.atr.iter().position(Option::is_some);
            assert_eq!(first, Some(3), "{smoothing:?}");
        }
    }

    #[test]
    fn flat_line_has_zero_atr() {
        let bars = make_ohlc_bars(&[(10.0, 10.0, 10.0, 10.0); 8]);
        let vol = average_true_range(&bars, 4, Smoothing::Sma).unwrap();
        for v in vol.atr.iter().skip(3) {
            assert_eq!(*v, Some(0.0));
        }
    }

    #[test]
    fn zero_length_is_rejected() {
        assert!(matches!(
            average_true_range(&sample_bars(), 0, Smoothing::Sma),
            Err(EngineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn wilder_gap_after_seed_ends_series() {
        let values = [Some(1.0), Some(2.0), Some(3.0), None, Some(5.0)];
        let result = wilder_smooth(&values, 2);
        assert_eq!(result[1], Some(1.5));
        assert!(result[3].is_none());
        assert!(result[4].is_none());
    }

    #[test]
    fn atr_indicator_name_and_lookback() {
        let atr = Atr::new(14, Smoothing::Sma);
        assert_eq!(atr.name(), "atr_14");
        assert_eq!(atr.lookback(), 13);
        assert_eq!(Atr::new(14, Smoothing::Wilder).name(), "atr_14_wilder");
    }
}
