//! Full per-symbol pipeline and the latest-bar entry check.
//!
//! bars → ATR → Chandelier states → signals → backtest → performance.
//! Any engine-stage error aborts the whole run; nothing partial is returned.

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

use crate::backtest::{run_backtest, BacktestOutcome};
use crate::chandelier::{compute_chandelier_exit, ChandelierSeries};
use crate::config::StrategyConfig;
use crate::domain::{Bar, Direction, Signal};
use crate::error::{require_bars, EngineError, EngineResult};
use crate::performance::{summarize_performance, PerformanceSummary, TradeStats};
use crate::signals::generate_signals;

/// Everything one pipeline run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub chandelier: ChandelierSeries,
    pub signals: Vec<Signal>,
    pub backtest: BacktestOutcome,
    pub performance: PerformanceSummary,
    pub trade_stats: TradeStats,
}

/// Run every stage over `bars`.
pub fn run_pipeline(bars: &[Bar], config: &StrategyConfig) -> EngineResult<PipelineOutput> {
    config.validate()?;
    let chandelier = compute_chandelier_exit(bars, &config.chandelier)?;
    let signals = generate_signals(bars, &chandelier.states, config.trend_filter.as_ref())?;
    let backtest = run_backtest(bars, &signals, &config.backtest)?;
    let performance = summarize_performance(&backtest.portfolio_values());
    let trade_stats = TradeStats::from_trades(&backtest.trades);

    if let Some(bar) = bars.last() {
        info!(
            "{}: {} bars, {} trades, total return {:.2}%, max drawdown {:.2}%",
            bar.symbol,
            bars.len(),
            trade_stats.trade_count,
            performance.total_return * 100.0,
            performance.max_drawdown * 100.0
        );
    }

    Ok(PipelineOutput {
        chandelier,
        signals,
        backtest,
        performance,
        trade_stats,
    })
}

/// Outcome of checking whether the last bar is an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryCheck {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    pub direction: Direction,
    pub exit_level: f64,
    pub signal: Signal,
}

impl EntryCheck {
    pub fn is_entry(&self) -> bool {
        self.signal == Signal::Buy
    }
}

/// Check whether the last bar on or before `end_date` carries a Buy.
///
/// Bars after `end_date` are dropped first; fewer than `length + 1`
/// remaining bars is `InsufficientData`.
pub fn check_entry(
    bars: &[Bar],
    end_date: Option<NaiveDate>,
    config: &StrategyConfig,
) -> EngineResult<EntryCheck> {
    config.validate()?;
    let cutoff = match end_date {
        Some(end) => bars.partition_point(|b| b.date <= end),
        None => bars.len(),
    };
    let bars = &bars[..cutoff];
    require_bars(config.chandelier.min_bars(), bars.len())?;

    let chandelier = compute_chandelier_exit(bars, &config.chandelier)?;
    let signals = generate_signals(bars, &chandelier.states, config.trend_filter.as_ref())?;

    let (Some(bar), Some(state), Some(&signal)) =
        (bars.last(), chandelier.latest(), signals.last())
    else {
        return Err(EngineError::InsufficientData {
            required: config.chandelier.min_bars(),
            available: bars.len(),
        });
    };

    Ok(EntryCheck {
        symbol: bar.symbol.clone(),
        date: bar.date,
        close: bar.close,
        direction: state.direction,
        exit_level: state.exit_level,
        signal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{make_bars, make_ohlc_bars};

    fn rising_bars(n: usize) -> Vec<Bar> {
        let data: Vec<_> = (0..n)
            .map(|i| {
                let c = 10.0 + 10.0 * i as f64 / 29.0;
                (c, c + 0.5, c - 0.5, c)
            })
            .collect();
        make_ohlc_bars(&data)
    }

    #[test]
    fn pipeline_on_rising_series_opens_one_position() {
        let out = run_pipeline(&rising_bars(30), &StrategyConfig::default()).unwrap();
        assert_eq!(out.signals.len(), 30);
        assert_eq!(out.signals[14], Signal::Buy);
        assert!(out.backtest.trades.is_empty());
        assert!(out.backtest.open_position.is_some());
        assert!(out.performance.total_return > 0.0);
        assert_eq!(out.trade_stats.trade_count, 0);
    }

    #[test]
    fn pipeline_is_idempotent() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + 10.0 * (i as f64 * 0.15).sin() + i as f64 * 0.05)
            .collect();
        let bars = make_bars(&closes);
        let cfg = StrategyConfig::default();
        assert_eq!(run_pipeline(&bars, &cfg).unwrap(), run_pipeline(&bars, &cfg).unwrap());
    }

    #[test]
    fn pipeline_rejects_short_history() {
        assert!(matches!(
            run_pipeline(&make_bars(&[10.0; 5]), &StrategyConfig::default()),
            Err(EngineError::InsufficientData { required: 15, available: 5 })
        ));
    }

    #[test]
    fn entry_on_flip_bar() {
        let bars = rising_bars(15);
        let check = check_entry(&bars, None, &StrategyConfig::default()).unwrap();
        assert!(check.is_entry());
        assert_eq!(check.direction, Direction::Long);
        assert_eq!(check.date, bars[14].date);
    }

    #[test]
    fn end_date_truncates_history() {
        let bars = rising_bars(30);
        let cfg = StrategyConfig::default();
        assert!(!check_entry(&bars, None, &cfg).unwrap().is_entry());
        let check = check_entry(&bars, Some(bars[14].date), &cfg).unwrap();
        assert!(check.is_entry());
        assert_eq!(check.close, bars[14].close);
    }

    #[test]
    fn end_date_before_enough_history() {
        let bars = rising_bars(30);
        assert_eq!(
            check_entry(&bars, Some(bars[9].date), &StrategyConfig::default()),
            Err(EngineError::InsufficientData {
                required: 15,
                available: 10
            })
        );
    }

    #[test]
    fn screening_filter_blocks_early_flip() {
        // SMA(20) is undefined at bar 14, so the filtered check finds no entry.
        let bars = rising_bars(15);
        let check = check_entry(&bars, None, &StrategyConfig::screening()).unwrap();
        assert_eq!(check.signal, Signal::Hold);
    }
}
