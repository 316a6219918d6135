//! Export: per-bar snapshot CSV, trade CSV, and JSON results.
//!
//! - **Snapshot CSV**: one row per bar with indicator state, signal and ledger
//! - **Trades CSV**: closed round trips
//! - **JSON**: full round-trip serialization with schema versioning
//!
//! `save_artifacts` writes all of them plus the last-N-bar tail into one
//! directory per run.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chandelier_core::TradeRecord;

use crate::runner::{RunResult, SCHEMA_VERSION};

/// Rows kept by the tail export when no count is given.
pub const DEFAULT_TAIL_ROWS: usize = 20;

const SNAPSHOT_HEADER: [&str; 17] = [
    "date",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "atr",
    "long_stop",
    "short_stop",
    "direction",
    "exit_level",
    "signal",
    "position",
    "cash",
    "holdings_value",
    "portfolio_value",
    "drawdown",
];

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunResult` to pretty JSON.
pub fn export_json(result: &RunResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize RunResult to JSON")
}

/// Deserialize a `RunResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunResult> {
    let result: RunResult =
        serde_json::from_str(json).context("failed to deserialize RunResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_default()
}

/// Per-bar snapshot of every bar in the run.
pub fn export_snapshot_csv(result: &RunResult) -> Result<String> {
    export_snapshot_rows(result, 0)
}

/// Snapshot restricted to the last `rows` bars.
pub fn export_tail_csv(result: &RunResult, rows: usize) -> Result<String> {
    export_snapshot_rows(result, result.bars.len().saturating_sub(rows))
}

fn export_snapshot_rows(result: &RunResult, from: usize) -> Result<String> {
    let output = &result.output;
    let n = result.bars.len();
    if output.chandelier.len() != n || output.signals.len() != n || output.backtest.portfolio.len() != n
    {
        bail!(
            "{}: inconsistent run lengths (bars {n}, states {}, signals {}, portfolio {})",
            result.symbol,
            output.chandelier.len(),
            output.signals.len(),
            output.backtest.portfolio.len()
        );
    }

    let drawdowns = chandelier_core::performance::drawdowns(&output.backtest.portfolio_values());

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(SNAPSHOT_HEADER)?;

    for i in from..n {
        let bar = &result.bars[i];
        let state = output.chandelier.states[i];
        let ledger = &output.backtest.portfolio[i];
        wtr.write_record([
            bar.date.to_string(),
            format!("{:.4}", bar.open),
            format!("{:.4}", bar.high),
            format!("{:.4}", bar.low),
            format!("{:.4}", bar.close),
            bar.volume.to_string(),
            opt(state.map(|s| s.atr)),
            opt(state.map(|s| s.long_stop)),
            opt(state.map(|s| s.short_stop)),
            state.map(|s| s.direction.to_string()).unwrap_or_default(),
            opt(state.map(|s| s.exit_level)),
            output.signals[i].to_string(),
            ledger.position_size.to_string(),
            format!("{:.2}", ledger.cash),
            format!("{:.2}", ledger.holdings_value),
            format!("{:.2}", ledger.portfolio_value),
            format!("{:.6}", drawdowns[i]),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export closed trades.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_date",
        "entry_price",
        "exit_date",
        "exit_price",
        "shares",
        "return_pct",
        "profit",
        "holding_days",
    ])?;

    for t in trades {
        wtr.write_record([
            t.entry_date.to_string(),
            format!("{:.4}", t.entry_price),
            t.exit_date.to_string(),
            format!("{:.4}", t.exit_price),
            t.shares.to_string(),
            format!("{:.4}", t.return_pct),
            format!("{:.2}", t.profit),
            t.holding_days().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one run.
///
/// Creates `{symbol}_{short_run_id}/` under `output_dir` containing:
/// - `result.json`: the full `RunResult`
/// - `bars.csv`: per-bar snapshot
/// - `recent.csv`: the last `tail_rows` bars of the snapshot
/// - `trades.csv`: closed trades
///
/// The directory name is content-addressed, so re-running the same
/// configuration on the same data overwrites the same artifacts.
pub fn save_artifacts(result: &RunResult, output_dir: &Path, tail_rows: usize) -> Result<PathBuf> {
    let dirname = format!("{}_{}", result.symbol, result.fingerprint.short_id());
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let files = [
        ("result.json", export_json(result)?),
        ("bars.csv", export_snapshot_csv(result)?),
        ("recent.csv", export_tail_csv(result, tail_rows)?),
        ("trades.csv", export_trades_csv(&result.output.backtest.trades)?),
    ];
    for (name, body) in files {
        let path = run_dir.join(name);
        std::fs::write(&path, body)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    log::info!("{}: artifacts saved to {}", result.symbol, run_dir.display());
    Ok(run_dir)
}

/// Load a `RunResult` from an artifact directory's `result.json`.
pub fn load_artifacts(dir: &Path) -> Result<RunResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
