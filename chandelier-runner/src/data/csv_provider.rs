//! CSV import provider.

use std::path::{Path, PathBuf};

use chandelier_core::data::{finalize_range, DataError, DataProvider, DataSource};
use chandelier_core::Bar;
use chrono::NaiveDate;
use serde::Deserialize;

/// Expected header of every symbol file.
pub const CSV_HEADER: &str = "date,open,high,low,close,volume";

/// One row of a symbol file. `volume` may be fractional in exported data.
#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Reads forward-adjusted daily bars from `<dir>/<SYMBOL>.csv`.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Symbols with a file in the data directory, sorted.
    pub fn list_symbols(&self) -> Result<Vec<String>, DataError> {
        let mut symbols = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }
        symbols.sort();
        Ok(symbols)
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<Bar>, DataError> {
        let path = self.symbol_path(symbol);
        if !path.is_file() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let malformed = |reason: String| DataError::Malformed {
            symbol: symbol.to_string(),
            reason,
        };

        let mut reader = csv::Reader::from_path(&path).map_err(|e| malformed(e.to_string()))?;
        let mut bars = Vec::new();
        for (line, record) in reader.deserialize::<CsvRow>().enumerate() {
            let row = record.map_err(|e| malformed(e.to_string()))?;
            if !row.volume.is_finite() || row.volume < 0.0 {
                return Err(malformed(format!("row {}: invalid volume", line + 1)));
            }
            let bar = Bar {
                symbol: symbol.to_string(),
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume.round() as u64,
            };
            if !bar.is_sane() {
                return Err(malformed(format!(
                    "row {} ({}): inconsistent OHLC",
                    line + 1,
                    bar.date
                )));
            }
            bars.push(bar);
        }
        Ok(bars)
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn source(&self) -> DataSource {
        DataSource::CsvImport
    }

    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        let bars = self.read_all(symbol)?;
        log::debug!("{symbol}: read {} rows from {}", bars.len(), self.dir.display());
        finalize_range(symbol, bars, start, end)
    }
}
