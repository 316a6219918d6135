//! Chandelier CLI: entry checks, backtests, screening and regime analysis.
//!
//! Commands:
//! - `check`: is the latest bar of a symbol a Chandelier Exit buy?
//! - `backtest`: run the full pipeline for one or more symbols and save artifacts
//! - `screen`: entry check across many symbols in parallel
//! - `analyze`: classify the current market regime of a symbol
//!
//! Data comes from `<data-dir>/<SYMBOL>.csv` or, with `--synthetic`, from a
//! deterministic random walk. Logging goes to stderr; set `RUST_LOG` to adjust.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chandelier_core::data::DataProvider;
use chandelier_core::{EntryCheck, RegimeParams, RegimeReport, StrategyConfig};
use chandelier_runner::{
    analyze_symbol, check_symbol, run_batch, save_artifacts, screen_entries, CsvProvider,
    DateWindow, RunConfig, RunResult, SyntheticProvider, DEFAULT_TAIL_ROWS,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Calendar days fetched before the end date when no start is given.
const DEFAULT_HISTORY_DAYS: i64 = 365 * 2;
/// Regime analysis needs ~50 trading days; this covers them with holidays.
const DEFAULT_ANALYZE_DAYS: i64 = 120;

#[derive(Parser)]
#[command(
    name = "chandelier",
    about = "Chandelier Exit signal engine and long-only backtester"
)]
struct Cli {
    /// Directory holding one `<SYMBOL>.csv` per symbol.
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Use deterministic synthetic data instead of CSV files.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    /// Start date (YYYY-MM-DD).
    #[arg(long, global = true)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long, global = true)]
    end: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the latest bar of a symbol is an entry.
    Check {
        symbol: String,

        /// Path to a TOML run config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip the SMA trend filter on buys.
        #[arg(long, default_value_t = false)]
        no_trend_filter: bool,

        /// Print the result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Backtest symbols and save per-run artifacts.
    Backtest {
        /// Symbols to run. Defaults to `[backtest].symbols` from the config.
        symbols: Vec<String>,

        /// Path to a TOML run config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "output")]
        output: PathBuf,

        /// Rows kept in the recent-bars export.
        #[arg(long, default_value_t = DEFAULT_TAIL_ROWS)]
        tail: usize,
    },
    /// Screen symbols for entries on the latest bar.
    Screen {
        /// Symbols to screen. Defaults to every CSV file in the data directory.
        symbols: Vec<String>,

        /// Path to a TOML run config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip the SMA trend filter on buys.
        #[arg(long, default_value_t = false)]
        no_trend_filter: bool,

        /// Print the report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Classify the market regime of a symbol.
    Analyze {
        symbol: String,

        /// Print the report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let provider: Box<dyn DataProvider> = if cli.synthetic {
        Box::new(SyntheticProvider)
    } else {
        Box::new(CsvProvider::new(&cli.data_dir))
    };
    let start = parse_date(cli.start.as_deref())?;
    let end = parse_date(cli.end.as_deref())?;

    match cli.command {
        Commands::Check {
            symbol,
            config,
            no_trend_filter,
            json,
        } => {
            let run = load_config(config.as_deref())?;
            let window = resolve_window(start, end, &run, DEFAULT_HISTORY_DAYS)?;
            let strategy = screening_strategy(&run, no_trend_filter);
            let check = check_symbol(provider.as_ref(), &symbol, window, &strategy)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&check)?);
            } else {
                print_check(&check);
            }
            Ok(())
        }
        Commands::Backtest {
            symbols,
            config,
            output,
            tail,
        } => {
            let run = load_config(config.as_deref())?;
            let symbols = if symbols.is_empty() {
                run.backtest.symbols.clone()
            } else {
                symbols
            };
            if symbols.is_empty() {
                bail!("no symbols given on the command line or in [backtest].symbols");
            }
            let window = resolve_window(start, end, &run, DEFAULT_HISTORY_DAYS)?;
            run_backtest_cmd(provider.as_ref(), &symbols, window, &run.strategy(), &output, tail)
        }
        Commands::Screen {
            symbols,
            config,
            no_trend_filter,
            json,
        } => {
            let run = load_config(config.as_deref())?;
            let symbols = if !symbols.is_empty() {
                symbols
            } else if !run.backtest.symbols.is_empty() {
                run.backtest.symbols.clone()
            } else if cli.synthetic {
                bail!("--synthetic needs explicit symbols to screen");
            } else {
                CsvProvider::new(&cli.data_dir)
                    .list_symbols()
                    .with_context(|| format!("failed to list {}", cli.data_dir.display()))?
            };
            let window = resolve_window(start, end, &run, DEFAULT_HISTORY_DAYS)?;
            let strategy = screening_strategy(&run, no_trend_filter);
            let report = screen_entries(provider.as_ref(), &symbols, window, &strategy);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            println!(
                "Screened {} symbols: {} entries, {} skipped",
                symbols.len(),
                report.entry_count(),
                report.skipped.len()
            );
            for check in report.entries() {
                print_check(check);
            }
            for skipped in &report.skipped {
                println!("  skipped {}: {}", skipped.symbol, skipped.reason);
            }
            Ok(())
        }
        Commands::Analyze { symbol, json } => {
            let window = resolve_window(start, end, &RunConfig::default(), DEFAULT_ANALYZE_DAYS)?;
            let report =
                analyze_symbol(provider.as_ref(), &symbol, window, &RegimeParams::default())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_regime(&symbol, &report);
            }
            Ok(())
        }
    }
}

fn parse_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("invalid date '{s}', expected YYYY-MM-DD"))
        })
        .transpose()
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => Ok(RunConfig::from_file(path)?),
        None => Ok(RunConfig::default()),
    }
}

/// Command-line dates win over the config file; the end defaults to today.
fn resolve_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    run: &RunConfig,
    history_days: i64,
) -> Result<DateWindow> {
    let end = end
        .or(run.backtest.end_date)
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let start = start
        .or(run.backtest.start_date)
        .unwrap_or(end - chrono::Duration::days(history_days));
    log::debug!("date window {start} to {end}");
    Ok(DateWindow::new(start, end)?)
}

/// Entry checks filter buys on the SMA trend unless disabled.
fn screening_strategy(run: &RunConfig, no_trend_filter: bool) -> StrategyConfig {
    let mut strategy = run.strategy();
    if no_trend_filter {
        strategy.trend_filter = None;
    } else if strategy.trend_filter.is_none() {
        strategy.trend_filter = StrategyConfig::screening().trend_filter;
    }
    strategy
}

fn run_backtest_cmd(
    provider: &dyn DataProvider,
    symbols: &[String],
    window: DateWindow,
    strategy: &StrategyConfig,
    output: &Path,
    tail: usize,
) -> Result<()> {
    let report = run_batch(provider, symbols, window, strategy);
    for result in &report.results {
        print_summary(result);
        let run_dir = save_artifacts(result, output, tail)?;
        println!("  artifacts: {}", run_dir.display());
    }
    for skipped in &report.skipped {
        println!("skipped {}: {}", skipped.symbol, skipped.reason);
    }
    if report.results.is_empty() {
        bail!("no symbol could be backtested");
    }
    Ok(())
}

fn print_check(check: &EntryCheck) {
    println!(
        "{} {}: close {:.2}, direction {}, exit level {:.2}, signal {}{}",
        check.symbol,
        check.date,
        check.close,
        check.direction,
        check.exit_level,
        check.signal,
        if check.is_entry() { "  <- ENTRY" } else { "" }
    );
}

fn print_summary(result: &RunResult) {
    let perf = &result.output.performance;
    let stats = &result.output.trade_stats;
    let backtest = &result.output.backtest;

    println!();
    println!(
        "=== {} ({} bars, run {}) ===",
        result.symbol,
        perf.bar_count,
        result.fingerprint.short_id()
    );
    if result.is_synthetic() {
        println!("  data:          SYNTHETIC");
    }
    println!("  total return:  {:.2}%", perf.total_return * 100.0);
    println!("  max drawdown:  {:.2}%", perf.max_drawdown * 100.0);
    match perf.sharpe_ratio {
        Some(sharpe) => println!("  sharpe:        {sharpe:.3}"),
        None => println!("  sharpe:        n/a"),
    }
    println!(
        "  trades:        {} ({} winning{})",
        stats.trade_count,
        stats.winning_trades,
        stats
            .win_rate
            .map(|w| format!(", {:.1}% win rate", w * 100.0))
            .unwrap_or_default()
    );
    println!("  total profit:  {:.2}", stats.total_profit);
    if let Some(open) = &backtest.open_position {
        println!(
            "  open position: {} shares since {} at {:.2}",
            open.shares, open.entry_date, open.entry_price
        );
    }
    if let Some(value) = backtest.final_value() {
        println!("  final value:   {value:.2}");
    }
}

fn print_regime(symbol: &str, report: &RegimeReport) {
    println!("{symbol}: {}", report.regime);
    println!(
        "  trend:    {:?} (SMA short {:.2} vs long {:.2})",
        report.trend, report.short_ma, report.long_ma
    );
    println!("  strength: {:?} (ADX {:.1})", report.strength, report.adx);
    println!("  RSI:      {:?} ({:.1})", report.rsi, report.rsi_value);
    println!(
        "  momentum: {:?} (MACD histogram {:.4})",
        report.momentum, report.macd_histogram
    );
}
