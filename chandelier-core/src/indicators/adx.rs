//! ADX: Average Directional Index (Wilder).
//!
//! 1. +DM / -DM from consecutive highs and lows
//! 2. Wilder-smooth +DM, -DM and TR (TR[0] excluded, it has no previous close)
//! 3. +DI = 100 * sDM+ / sTR, -DI = 100 * sDM- / sTR
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = Wilder-smoothed DX
//!
//! First defined value at index 2 * period - 1.

use super::atr::{true_range, wilder_smooth};
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            name: format!("adx_{period}"),
        }
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        2 * self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let n = bars.len();
        if n < 2 {
            return vec![None; n];
        }

        let mut plus_dm = vec![None; n];
        let mut minus_dm = vec![None; n];
        for i in 1..n {
            let up = bars[i].high - bars[i - 1].high;
            let down = bars[i - 1].low - bars[i].low;
            if up.is_nan() || down.is_nan() {
                continue;
            }
            plus_dm[i] = Some(if up > down && up > 0.0 { up } else { 0.0 });
            minus_dm[i] = Some(if down > up && down > 0.0 { down } else { 0.0 });
        }

        let tr: Vec<Option<f64>> = true_range(bars)
            .into_iter()
            .enumerate()
            .map(|(i, v)| if i == 0 || v.is_nan() { None } else { Some(v) })
            .collect();

        let s_tr = wilder_smooth(&tr, self.period);
        let s_plus = wilder_smooth(&plus_dm, self.period);
        let s_minus = wilder_smooth(&minus_dm, self.period);

        let dx: Vec<Option<f64>> = (0..n)
            .map(|i| {
                let (tr, plus, minus) = (s_tr[i]?, s_plus[i]?, s_minus[i]?);
                if tr == 0.0 {
                    return Some(0.0);
                }
                let plus_di = 100.0 * plus / tr;
                let minus_di = 100.0 * minus / tr;
                let sum = plus_di + minus_di;
                Some(if sum == 0.0 {
                    0.0
                } else {
                    100.0 * (plus_di - minus_di).abs() / sum
                })
            })
            .collect();

        wilder_smooth(&dx, self.period)
    }
}
