//! Market regime classification from four independent readings on the
//! latest bar: moving-average trend, ADX strength, RSI zone and the MACD
//! histogram's zero cross. A fixed priority order combines them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::Bar;
use crate::error::{require_bars, EngineError, EngineResult};
use crate::indicators::{last_defined, Adx, Indicator, Macd, Rsi, Sma};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendReading {
    Up,
    Down,
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthReading {
    Strong,
    Weak,
    Ranging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiReading {
    Ranging,
    Overbought,
    Oversold,
    Trending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumReading {
    TurningUp,
    TurningDown,
    Ranging,
}

/// Combined verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    Uptrend,
    Downtrend,
    Ranging,
    WeakTrend,
    /// Readings disagree.
    Mixed,
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketRegime::Uptrend => "uptrend",
            MarketRegime::Downtrend => "downtrend",
            MarketRegime::Ranging => "ranging",
            MarketRegime::WeakTrend => "weak trend",
            MarketRegime::Mixed => "mixed signals",
        };
        f.write_str(s)
    }
}

/// Indicator periods and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeParams {
    pub short_ma: usize,
    pub long_ma: usize,
    pub adx_period: usize,
    pub adx_strong: f64,
    pub adx_ranging: f64,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for RegimeParams {
    fn default() -> Self {
        Self {
            short_ma: 20,
            long_ma: 50,
            adx_period: 14,
            adx_strong: 25.0,
            adx_ranging: 20.0,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl RegimeParams {
    pub fn validate(&self) -> EngineResult<()> {
        let periods = [
            self.short_ma,
            self.long_ma,
            self.adx_period,
            self.rsi_period,
            self.macd_fast,
            self.macd_signal,
        ];
        if periods.contains(&0) {
            return Err(EngineError::InvalidParameter(
                "regime periods must be >= 1".into(),
            ));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(EngineError::InvalidParameter(
                "MACD fast period must be shorter than slow".into(),
            ));
        }
        if self.adx_ranging > self.adx_strong {
            return Err(EngineError::InvalidParameter(
                "ADX ranging threshold must not exceed strong threshold".into(),
            ));
        }
        Ok(())
    }

    /// Bars needed for every reading to be defined on the last bar.
    pub fn min_bars(&self) -> usize {
        let macd = self.macd_slow + self.macd_signal; // histogram plus one prior value
        [
            self.short_ma,
            self.long_ma,
            2 * self.adx_period,
            self.rsi_period + 1,
            macd,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Readings plus the combined verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeReport {
    pub trend: TrendReading,
    pub strength: StrengthReading,
    pub rsi: RsiReading,
    pub momentum: MomentumReading,
    pub regime: MarketRegime,
    pub short_ma: f64,
    pub long_ma: f64,
    pub adx: f64,
    pub rsi_value: f64,
    pub macd_histogram: f64,
}

pub fn classify_trend(short_ma: f64, long_ma: f64) -> TrendReading {
    if short_ma > long_ma {
        TrendReading::Up
    } else if short_ma < long_ma {
        TrendReading::Down
    } else {
        TrendReading::Sideways
    }
}

pub fn classify_strength(adx: f64, strong: f64, ranging: f64) -> StrengthReading {
    if adx > strong {
        StrengthReading::Strong
    } else if adx < ranging {
        StrengthReading::Ranging
    } else {
        StrengthReading::Weak
    }
}

pub fn classify_rsi(rsi: f64) -> RsiReading {
    if rsi > 40.0 && rsi < 60.0 {
        RsiReading::Ranging
    } else if rsi > 70.0 {
        RsiReading::Overbought
    } else if rsi < 30.0 {
        RsiReading::Oversold
    } else {
        RsiReading::Trending
    }
}

pub fn classify_momentum(prev_histogram: f64, histogram: f64) -> MomentumReading {
    if histogram > 0.0 && prev_histogram <= 0.0 {
        MomentumReading::TurningUp
    } else if histogram < 0.0 && prev_histogram >= 0.0 {
        MomentumReading::TurningDown
    } else {
        MomentumReading::Ranging
    }
}

/// Priority order: strong trend in either direction, then agreement that
/// the market is ranging, then a weak trend; anything else is mixed.
pub fn combine_readings(
    trend: TrendReading,
    strength: StrengthReading,
    rsi: RsiReading,
    momentum: MomentumReading,
) -> MarketRegime {
    match (trend, strength) {
        (TrendReading::Up, StrengthReading::Strong) => return MarketRegime::Uptrend,
        (TrendReading::Down, StrengthReading::Strong) => return MarketRegime::Downtrend,
        _ => {}
    }
    if momentum == MomentumReading::Ranging && rsi == RsiReading::Ranging {
        return MarketRegime::Ranging;
    }
    if strength == StrengthReading::Weak {
        return MarketRegime::WeakTrend;
    }
    MarketRegime::Mixed
}

/// Classify the regime as of the last bar.
pub fn analyze_regime(bars: &[Bar], params: &RegimeParams) -> EngineResult<RegimeReport> {
    params.validate()?;
    require_bars(params.min_bars(), bars.len())?;

    let undefined =
        |what: &str| EngineError::DegenerateStatistic(format!("{what} undefined on the last bar"));

    let short_ma = last_defined(&Sma::new(params.short_ma).compute(bars))
        .ok_or_else(|| undefined("short MA"))?;
    let long_ma = last_defined(&Sma::new(params.long_ma).compute(bars))
        .ok_or_else(|| undefined("long MA"))?;
    let adx = last_defined(&Adx::new(params.adx_period).compute(bars))
        .ok_or_else(|| undefined("ADX"))?;
    let rsi_value = last_defined(&Rsi::new(params.rsi_period).compute(bars))
        .ok_or_else(|| undefined("RSI"))?;

    let macd = Macd::new(params.macd_fast, params.macd_slow, params.macd_signal).compute(bars);
    let n = macd.histogram.len();
    let (prev_hist, hist) = match (macd.histogram[n - 2], macd.histogram[n - 1]) {
        (Some(p), Some(h)) => (p, h),
        _ => return Err(undefined("MACD histogram")),
    };

    let trend = classify_trend(short_ma, long_ma);
    let strength = classify_strength(adx, params.adx_strong, params.adx_ranging);
    let rsi = classify_rsi(rsi_value);
    let momentum = classify_momentum(prev_hist, hist);

    Ok(RegimeReport {
        trend,
        strength,
        rsi,
        momentum,
        regime: combine_readings(trend, strength, rsi, momentum),
        short_ma,
        long_ma,
        adx,
        rsi_value,
        macd_histogram: hist,
    })
}
