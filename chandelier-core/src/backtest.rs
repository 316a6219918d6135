//! Single-position backtest simulator.
//!
//! State machine over one slot: Flat → Long → Flat → … No shorting, no
//! pyramiding. Fills happen at the signal bar's close. Signals that do not
//! apply to the current state (Buy while long, Sell while flat, Buy that
//! cannot afford one share) are ignored, logged and counted.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::BacktestParams;
use crate::domain::{Bar, OpenPosition, PortfolioState, Signal, TradeRecord};
use crate::error::{EngineError, EngineResult};

/// Ledger history and closed trades from one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestOutcome {
    pub portfolio: Vec<PortfolioState>,
    pub trades: Vec<TradeRecord>,
    /// Position still held after the last bar, marked to market but not closed.
    pub open_position: Option<OpenPosition>,
    pub ignored_signals: usize,
}

impl BacktestOutcome {
    pub fn portfolio_values(&self) -> Vec<f64> {
        self.portfolio.iter().map(|p| p.portfolio_value).collect()
    }

    pub fn final_value(&self) -> Option<f64> {
        self.portfolio.last().map(|p| p.portfolio_value)
    }
}

/// Cash plus the optional open position.
#[derive(Debug, Clone)]
struct Ledger {
    cash: f64,
    commission_rate: f64,
    position: Option<OpenPosition>,
}

impl Ledger {
    fn new(params: &BacktestParams) -> Self {
        Self {
            cash: params.initial_capital,
            commission_rate: params.commission_rate,
            position: None,
        }
    }

    /// Open a position with all affordable whole shares. Returns false on a no-op.
    fn buy(&mut self, bar: &Bar) -> bool {
        if self.position.is_some() {
            debug!("{} {}: buy ignored, already long", bar.symbol, bar.date);
            return false;
        }
        let unit_cost = bar.close * (1.0 + self.commission_rate);
        if !(unit_cost > 0.0) {
            debug!("{} {}: buy ignored, non-positive price", bar.symbol, bar.date);
            return false;
        }
        let shares = (self.cash / unit_cost).floor();
        if !(shares >= 1.0) {
            debug!(
                "{} {}: buy ignored, cash {:.2} cannot cover one share at {:.4}",
                bar.symbol, bar.date, self.cash, bar.close
            );
            return false;
        }
        let shares = shares as u64;
        let cost = shares as f64 * bar.close * (1.0 + self.commission_rate);
        self.cash -= cost;
        self.position = Some(OpenPosition {
            entry_date: bar.date,
            entry_price: bar.close,
            shares,
            entry_cost: cost,
        });
        info!(
            "{} {}: buy {shares} @ {:.4} (cost {:.2})",
            bar.symbol, bar.date, bar.close, cost
        );
        true
    }

    /// Close the whole position. Returns the trade, or `None` on a no-op.
    fn sell(&mut self, bar: &Bar) -> Option<TradeRecord> {
        let Some(position) = self.position.take() else {
            debug!("{} {}: sell ignored, no open position", bar.symbol, bar.date);
            return None;
        };
        let revenue = position.shares as f64 * bar.close * (1.0 - self.commission_rate);
        self.cash += revenue;
        let trade = TradeRecord {
            entry_date: position.entry_date,
            entry_price: position.entry_price,
            exit_date: bar.date,
            exit_price: bar.close,
            shares: position.shares,
            return_pct: bar.close / position.entry_price - 1.0,
            profit: revenue - position.entry_cost,
        };
        info!(
            "{} {}: sell {} @ {:.4} (profit {:.2}, return {:.2}%)",
            bar.symbol,
            bar.date,
            trade.shares,
            bar.close,
            trade.profit,
            trade.return_pct * 100.0
        );
        Some(trade)
    }

    fn snapshot(&self, bar: &Bar) -> PortfolioState {
        let (position_size, holdings_value) = match &self.position {
            Some(p) => (p.shares, p.market_value(bar.close)),
            None => (0, 0.0),
        };
        PortfolioState {
            date: bar.date,
            position_size,
            cash: self.cash,
            holdings_value,
            portfolio_value: self.cash + holdings_value,
        }
    }
}

/// Replay `bars` against `signals` and record the ledger on every bar.
pub fn run_backtest(
    bars: &[Bar],
    signals: &[Signal],
    params: &BacktestParams,
) -> EngineResult<BacktestOutcome> {
    params.validate()?;
    if bars.len() != signals.len() {
        return Err(EngineError::InvalidParameter(format!(
            "{} signals for {} bars",
            signals.len(),
            bars.len()
        )));
    }

    let mut ledger = Ledger::new(params);
    let mut portfolio = Vec::with_capacity(bars.len());
    let mut trades = Vec::new();
    let mut ignored_signals = 0;

    for (bar, signal) in bars.iter().zip(signals) {
        match signal {
            Signal::Buy => {
                if !ledger.buy(bar) {
                    ignored_signals += 1;
                }
            }
            Signal::Sell => match ledger.sell(bar) {
                Some(trade) => trades.push(trade),
                None => ignored_signals += 1,
            },
            Signal::Hold => {}
        }
        portfolio.push(ledger.snapshot(bar));
    }

    Ok(BacktestOutcome {
        portfolio,
        trades,
        open_position: ledger.position,
        ignored_signals,
    })
}
