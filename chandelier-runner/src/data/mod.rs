//! Data providers for the runner.
//!
//! - `CsvProvider`: one `<SYMBOL>.csv` per symbol in a directory
//! - `SyntheticProvider`: deterministic random walk, offline development only
//!
//! Both implement `chandelier_core::data::DataProvider` and return bars
//! ascending, restricted to the requested window.

mod csv_provider;
mod synthetic;

pub use csv_provider::{CsvProvider, CSV_HEADER};
pub use synthetic::{generate_synthetic_bars, SyntheticProvider};
