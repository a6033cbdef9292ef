//! Property-based tests for the weekend presets.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use datepoll_core::presets::{next_weekends, quarterly_weekends, this_weekend};
use proptest::prelude::*;

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2024i32..=2027, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
        .prop_flat_map(|date| (0i64..4).prop_map(move |extra| date + Duration::days(extra)))
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

fn is_weekend_triple(triple: &[NaiveDate]) -> bool {
    triple.len() == 3
        && triple[0].weekday() == Weekday::Fri
        && triple[1] == triple[0] + Duration::days(1)
        && triple[2] == triple[0] + Duration::days(2)
}

// ---------------------------------------------------------------------------
// Property 1: this_weekend is always one Friday-Sunday triple
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn this_weekend_is_a_triple(reference in arb_date(), upcoming in any::<bool>()) {
        let dates = this_weekend(reference, upcoming);
        prop_assert!(is_weekend_triple(&dates), "{:?}", dates);

        if upcoming {
            prop_assert!(dates[0] > reference);
        } else {
            // Never more than a week away, and the current weekend if inside one.
            prop_assert!(dates[0] <= reference + Duration::days(7));
            prop_assert!(dates[2] >= reference);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: next_weekends yields n triples exactly one week apart
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn next_weekends_shape(
        reference in arb_date(),
        n in 0u32..=12,
        upcoming in any::<bool>(),
    ) {
        let dates = next_weekends(reference, n, upcoming);
        prop_assert_eq!(dates.len(), 3 * n as usize);

        let triples: Vec<&[NaiveDate]> = dates.chunks(3).collect();
        for triple in &triples {
            prop_assert!(is_weekend_triple(triple));
        }
        for pair in triples.windows(2) {
            prop_assert_eq!(pair[1][0] - pair[0][0], Duration::days(7));
        }
        if n > 0 {
            let first = this_weekend(reference, upcoming);
            prop_assert_eq!(&dates[..3], first.as_slice());
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: quarterly weekends start on/after the reference and stop at the horizon
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn quarterly_bounds(reference in arb_date()) {
        let dates = quarterly_weekends(reference);

        // At least eight Fridays fit in any span of two full months plus change.
        prop_assert!(dates.len() >= 8 * 3);
        for triple in dates.chunks(3) {
            prop_assert!(is_weekend_triple(triple));
            prop_assert!(triple[0] >= reference);
        }

        let last_friday = dates[dates.len() - 3];
        let months_ahead = (last_friday.year() - reference.year()) * 12
            + last_friday.month() as i32
            - reference.month() as i32;
        prop_assert!(months_ahead <= 2, "last Friday {} too far from {}", last_friday, reference);
        prop_assert!(last_friday + Duration::days(7) > last_day_two_months_out(reference));
    }
}

fn last_day_two_months_out(date: NaiveDate) -> NaiveDate {
    let (mut y, mut m) = (date.year(), date.month() + 3);
    if m > 12 {
        m -= 12;
        y += 1;
    }
    NaiveDate::from_ymd_opt(y, m, 1).unwrap().pred_opt().unwrap()
}

// ---------------------------------------------------------------------------
// Property 4: every preset is strictly ascending
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn presets_strictly_ascending(reference in arb_date(), n in 0u32..=8) {
        for dates in [
            this_weekend(reference, true),
            next_weekends(reference, n, false),
            quarterly_weekends(reference),
        ] {
            for window in dates.windows(2) {
                prop_assert!(window[0] < window[1]);
            }
        }
    }
}
