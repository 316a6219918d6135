//! Equity-curve statistics.
//!
//! From the per-bar portfolio value series:
//! - simple returns with r[0] = 0
//! - cumulative return = prod(1 + r) - 1
//! - drawdown d[i] = pv[i] / max(pv[0..=i]) - 1, always <= 0
//! - Sharpe = sqrt(252) * mean(r) / stddev(r), sample stddev (n - 1)
//!
//! A zero-variance return series makes the Sharpe ratio undefined. The
//! function form reports `DegenerateStatistic`; the summary stores `None`.

use serde::{Deserialize, Serialize};

use crate::domain::TradeRecord;
use crate::error::{EngineError, EngineResult};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Summary of one equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub max_drawdown: f64,
    /// Bar index of the running peak preceding the deepest drawdown.
    pub drawdown_peak: Option<usize>,
    /// Bar index of the deepest drawdown.
    pub drawdown_trough: Option<usize>,
    /// `None` when the return series is degenerate.
    pub sharpe_ratio: Option<f64>,
    pub bar_count: usize,
}

/// Deepest peak-to-trough decline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Drawdown {
    pub depth: f64,
    pub peak_index: usize,
    pub trough_index: usize,
}

/// Reduce a portfolio value series to summary statistics.
pub fn summarize_performance(portfolio_values: &[f64]) -> PerformanceSummary {
    let returns = simple_returns(portfolio_values);
    let drawdown = max_drawdown(portfolio_values);
    PerformanceSummary {
        total_return: cumulative_returns(&returns).last().copied().unwrap_or(0.0),
        max_drawdown: drawdown.map_or(0.0, |d| d.depth),
        drawdown_peak: drawdown.map(|d| d.peak_index),
        drawdown_trough: drawdown.map(|d| d.trough_index),
        sharpe_ratio: sharpe_ratio(portfolio_values).ok(),
        bar_count: portfolio_values.len(),
    }
}

/// Per-bar simple returns; the first bar's return is 0.
pub fn simple_returns(values: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(values.len());
    if values.is_empty() {
        return returns;
    }
    returns.push(0.0);
    for w in values.windows(2) {
        // A wiped-out portfolio has no defined return; treat it as flat.
        returns.push(if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 });
    }
    returns
}

/// Running compounded return.
pub fn cumulative_returns(returns: &[f64]) -> Vec<f64> {
    let mut growth = 1.0;
    returns
        .iter()
        .map(|r| {
            growth *= 1.0 + r;
            growth - 1.0
        })
        .collect()
}

/// Drawdown from the running peak on every bar.
pub fn drawdowns(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&v| {
            peak = peak.max(v);
            if peak > 0.0 {
                v / peak - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Deepest drawdown and where it happened. `None` for an empty series.
pub fn max_drawdown(values: &[f64]) -> Option<Drawdown> {
    let mut peak_index = 0;
    let mut worst: Option<Drawdown> = None;
    for (i, &v) in values.iter().enumerate() {
        if v > values[peak_index] {
            peak_index = i;
        }
        let peak = values[peak_index];
        let depth = if peak > 0.0 { v / peak - 1.0 } else { 0.0 };
        if worst.map_or(true, |w| depth < w.depth) {
            worst = Some(Drawdown {
                depth,
                peak_index,
                trough_index: i,
            });
        }
    }
    worst
}

/// Annualized Sharpe-like ratio of the simple returns (zero risk-free rate).
pub fn sharpe_ratio(values: &[f64]) -> EngineResult<f64> {
    let returns = simple_returns(values);
    if returns.len() < 2 {
        return Err(EngineError::DegenerateStatistic(format!(
            "sharpe ratio needs at least 2 returns, got {}",
            returns.len()
        )));
    }
    let std = std_dev(&returns);
    if !std.is_finite() || std < 1e-15 {
        return Err(EngineError::DegenerateStatistic(
            "return series has zero variance".into(),
        ));
    }
    Ok(TRADING_DAYS_PER_YEAR.sqrt() * mean_f64(&returns) / std)
}

/// Trade-level counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub trade_count: usize,
    pub winning_trades: usize,
    /// `None` with no closed trades.
    pub win_rate: Option<f64>,
    pub total_profit: f64,
}

impl TradeStats {
    pub fn from_trades(trades: &[TradeRecord]) -> Self {
        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let win_rate = if trades.is_empty() {
            None
        } else {
            Some(winning_trades as f64 / trades.len() as f64)
        };
        Self {
            trade_count: trades.len(),
            winning_trades,
            win_rate,
            total_profit: trades.iter().map(|t| t.profit).sum(),
        }
    }
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;
    use chrono::NaiveDate;

    fn trade(profit: f64) -> TradeRecord {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        TradeRecord {
            entry_date: d,
            entry_price: 10.0,
            exit_date: d,
            exit_price: 10.0,
            shares: 1,
            return_pct: 0.0,
            profit,
        }
    }

    #[test]
    fn first_return_is_zero() {
        let r = simple_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r[0], 0.0);
        assert_approx(r[1], 0.1, 1e-12);
        assert_approx(r[2], -0.1, 1e-12);
    }

    #[test]
    fn cumulative_matches_endpoints() {
        let values = [100.0, 110.0, 99.0, 120.0];
        let cum = cumulative_returns(&simple_returns(&values));
        assert_approx(*cum.last().unwrap(), 0.2, 1e-12);
    }

    #[test]
    fn drawdown_series_and_max() {
        let values = [100.0, 120.0, 90.0, 110.0, 60.0, 130.0];
        let dd = drawdowns(&values);
        assert!(dd.iter().all(|d| *d <= 0.0));
        assert_approx(dd[2], -0.25, 1e-12);

        let worst = max_drawdown(&values).unwrap();
        assert_approx(worst.depth, -0.5, 1e-12);
        assert_eq!(worst.peak_index, 1);
        assert_eq!(worst.trough_index, 4);
    }

    #[test]
    fn monotone_curve_has_zero_drawdown() {
        let worst = max_drawdown(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(worst.depth, 0.0);
        assert!(max_drawdown(&[]).is_none());
    }

    #[test]
    fn sharpe_known_returns() {
        // Returns: [0, 0.1, -0.1] → mean 0 → ratio 0.
        let s = sharpe_ratio(&[100.0, 110.0, 99.0]).unwrap();
        assert_approx(s, 0.0, 1e-12);

        let values = [100.0, 101.0, 103.02];
        let r = simple_returns(&values);
        let expected = 252f64.sqrt() * mean_f64(&r) / std_dev(&r);
        assert_approx(sharpe_ratio(&values).unwrap(), expected, 1e-12);
        assert!(expected > 0.0);
    }

    #[test]
    fn constant_curve_is_degenerate() {
        assert!(matches!(
            sharpe_ratio(&[100.0; 10]),
            Err(EngineError::DegenerateStatistic(_))
        ));
        assert!(matches!(
            sharpe_ratio(&[100.0]),
            Err(EngineError::DegenerateStatistic(_))
        ));
        let summary = summarize_performance(&[100.0; 10]);
        assert!(summary.sharpe_ratio.is_none());
        assert_eq!(summary.total_return, 0.0);
        assert_eq!(summary.max_drawdown, 0.0);
    }

    #[test]
    fn summary_of_empty_series() {
        let summary = summarize_performance(&[]);
        assert_eq!(summary.bar_count, 0);
        assert_eq!(summary.total_return, 0.0);
        assert!(summary.drawdown_peak.is_none());
        assert!(summary.sharpe_ratio.is_none());
    }

    #[test]
    fn trade_stats() {
        let stats = TradeStats::from_trades(&[trade(10.0), trade(-5.0), trade(0.0), trade(3.0)]);
        assert_eq!(stats.trade_count, 4);
        assert_eq!(stats.winning_trades, 2);
        assert_eq!(stats.win_rate, Some(0.5));
        assert_approx(stats.total_profit, 8.0, 1e-12);
        assert!(TradeStats::from_trades(&[]).win_rate.is_none());
    }

    #[test]
    fn sample_std_dev() {
        // Sample std of [2, 4, 4, 4, 5, 5, 7, 9] = sqrt(32/7).
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_approx(std_dev(&v), (32.0f64 / 7.0).sqrt(), 1e-12);
    }
}
