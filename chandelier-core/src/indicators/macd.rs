//! MACD: difference of a fast and slow EMA of close, with an EMA signal line.
//!
//! macd = EMA(fast) - EMA(slow), defined from index slow-1.
//! signal = EMA(macd, signal_period), defined from index slow-1 + signal_period-1.
//! histogram = macd - signal.

use serde::{Deserialize, Serialize};

use super::ema::ema_of_series;
use crate::domain::Bar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy)]
pub struct Macd {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow");
        Self { fast, slow, signal }
    }

    /// First index with a defined histogram value.
    pub fn lookback(&self) -> usize {
        self.slow + self.signal - 2
    }

    pub fn compute(&self, bars: &[Bar]) -> MacdSeries {
        let n = bars.len();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);

        let macd: Vec<Option<f64>> = fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();

        // The MACD line is contiguous from slow-1, so its tail feeds the signal EMA.
        let mut signal = vec![None; n];
        if let Some(start) = macd.iter().position(Option::is_some) {
            let tail: Vec<f64> = macd[start..].iter().map(|v| v.unwrap_or(f64::NAN)).collect();
            for (offset, value) in ema_of_series(&tail, self.signal).into_iter().enumerate() {
                signal[start + offset] = value;
            }
        }

        let histogram = macd
            .iter()
            .zip(&signal)
            .map(|(m, s)| Some((*m)? - (*s)?))
            .collect();

        MacdSeries {
            macd,
            signal,
            histogram,
        }
    }
}
