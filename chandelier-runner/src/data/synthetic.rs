//! Synthetic bars for offline development.
//!
//! A random walk from 100.0 seeded by the symbol name, weekdays only.
//! Results on synthetic data are tagged through `DataSource::Synthetic`.

use chandelier_core::data::{finalize_range, DataError, DataProvider, DataSource};
use chandelier_core::Bar;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        log::warn!("{symbol}: using synthetic data");
        finalize_range(symbol, generate_synthetic_bars(symbol, start, end), start, end)
    }
}

/// Deterministic random-walk bars for `start..=end`, skipping weekends.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64);

        bars.push(Bar {
            symbol: symbol.to_string(),
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
    }

    #[test]
    fn same_symbol_same_bars() {
        let (start, end) = window();
        assert_eq!(
            generate_synthetic_bars("SPY", start, end),
            generate_synthetic_bars("SPY", start, end)
        );
    }

    #[test]
    fn different_symbols_differ() {
        let (start, end) = window();
        let a = generate_synthetic_bars("SPY", start, end);
        let b = generate_synthetic_bars("QQQ", start, end);
        assert_eq!(a.len(), b.len());
        assert_ne!(a[0].close, b[0].close);
    }

    #[test]
    fn weekdays_only_and_sane() {
        let (start, end) = window();
        let bars = generate_synthetic_bars("SPY", start, end);
        assert!(!bars.is_empty());
        for bar in &bars {
            assert!(!matches!(bar.date.weekday(), Weekday::Sat | Weekday::Sun));
            assert!(bar.is_sane(), "{bar:?}");
        }
    }

    #[test]
    fn weekend_only_window_is_unavailable() {
        let sat = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let sun = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let err = SyntheticProvider.fetch_daily_bars("SPY", sat, sun).unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
    }
}
