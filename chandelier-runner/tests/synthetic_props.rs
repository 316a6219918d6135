//! Property tests for the synthetic provider.

use chandelier_core::data::DataProvider;
use chandelier_runner::SyntheticProvider;
use chrono::NaiveDate;
use proptest::prelude::*;

fn arb_window() -> impl Strategy<Value = (NaiveDate, NaiveDate)> {
    (0i64..2000, 1i64..400).prop_map(|(offset, span)| {
        let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap() + chrono::Duration::days(offset);
        (start, start + chrono::Duration::days(span))
    })
}

proptest! {
    #[test]
    fn bars_stay_inside_window_ascending((start, end) in arb_window(), symbol in "[A-Z]{1,5}") {
        match SyntheticProvider.fetch_daily_bars(&symbol, start, end) {
            Ok(bars) => {
                prop_assert!(bars.iter().all(|b| b.date >= start && b.date <= end));
                prop_assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
                prop_assert!(bars.iter().all(|b| b.is_sane() && b.symbol == symbol));
            }
            // Only a weekend-only window can be empty.
            Err(_) => prop_assert!((end - start).num_days() < 2),
        }
    }

    #[test]
    fn prefix_windows_agree((start, end) in arb_window()) {
        let long = SyntheticProvider.fetch_daily_bars("PFX", start, end + chrono::Duration::days(30));
        let short = SyntheticProvider.fetch_daily_bars("PFX", start, end);
        if let (Ok(long), Ok(short)) = (long, short) {
            prop_assert_eq!(&long[..short.len()], &short[..]);
        }
    }
}
