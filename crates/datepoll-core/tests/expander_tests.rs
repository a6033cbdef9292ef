//! Tests for range expansion and merging.

use chrono::{Datelike, NaiveDate, Weekday};
use datepoll_core::{expand_range, expand_ranges, merge_ranges, ParsedDateRange, MAX_EXPANDED_DATES};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ── expand_range ────────────────────────────────────────────────────────────

#[test]
fn single_day_range() {
    let dates = expand_range(&ParsedDateRange::single(d(2025, 1, 10)));
    assert_eq!(dates, vec![d(2025, 1, 10)]);
}

#[test]
fn inclusive_on_both_ends() {
    let dates = expand_range(&ParsedDateRange::new(d(2025, 3, 3), d(2025, 3, 10)));
    assert_eq!(dates.len(), 8);
    assert_eq!(dates.first(), Some(&d(2025, 3, 3)));
    assert_eq!(dates.last(), Some(&d(2025, 3, 10)));
}

#[test]
fn weekday_filter_keeps_only_matching_days() {
    let range = ParsedDateRange::new(d(2025, 1, 1), d(2025, 1, 31))
        .with_days(&[Weekday::Fri, Weekday::Sat]);
    let dates = expand_range(&range);

    assert_eq!(dates.len(), 9, "Jan 2025 has five Fridays and four Saturdays");
    assert!(dates
        .iter()
        .all(|date| matches!(date.weekday(), Weekday::Fri | Weekday::Sat)));
}

#[test]
fn inverted_range_expands_to_nothing() {
    let range = ParsedDateRange::new(d(2025, 3, 10), d(2025, 3, 3));
    assert!(expand_range(&range).is_empty());
}

#[test]
fn crosses_month_and_leap_day() {
    let dates = expand_range(&ParsedDateRange::new(d(2024, 2, 27), d(2024, 3, 2)));
    assert_eq!(
        dates,
        vec![
            d(2024, 2, 27),
            d(2024, 2, 28),
            d(2024, 2, 29),
            d(2024, 3, 1),
            d(2024, 3, 2)
        ]
    );
}

#[test]
fn long_range_is_truncated_at_cap() {
    let range = ParsedDateRange::new(d(2025, 1, 1), d(2030, 12, 31));
    let dates = expand_range(&range);
    assert_eq!(dates.len(), MAX_EXPANDED_DATES);
    assert_eq!(dates[0], d(2025, 1, 1));
}

// ── expand_ranges / merge_ranges ────────────────────────────────────────────

#[test]
fn overlapping_ranges_deduplicate_and_union_times() {
    let ranges = vec![
        ParsedDateRange::new(d(2025, 1, 10), d(2025, 1, 12)).with_times(&["19:00".to_string()]),
        ParsedDateRange::new(d(2025, 1, 11), d(2025, 1, 13)).with_times(&["20:00".to_string()]),
    ];
    let expanded = expand_ranges(&ranges);

    assert_eq!(expanded.len(), 4);
    assert_eq!(expanded[0].date, d(2025, 1, 10));
    assert_eq!(expanded[0].times, vec!["19:00"]);
    assert_eq!(expanded[1].date, d(2025, 1, 11));
    assert_eq!(expanded[1].times, vec!["19:00", "20:00"]);
    assert_eq!(expanded[3].times, vec!["20:00"]);
}

#[test]
fn merge_sorts_dates_and_keeps_first_seen_time_order() {
    let ranges = vec![
        ParsedDateRange::single(d(2025, 2, 1)).with_times(&["21:00".to_string(), "18:00".to_string()]),
        ParsedDateRange::single(d(2025, 1, 5)).with_times(&["18:00".to_string()]),
    ];
    let result = merge_ranges("Game night", &ranges);

    assert_eq!(result.title, "Game night");
    assert_eq!(result.dates, vec![d(2025, 1, 5), d(2025, 2, 1)]);
    assert_eq!(result.times, vec!["21:00", "18:00"]);
}

#[test]
fn merge_of_nothing_is_empty() {
    let result = merge_ranges("Nothing", &[]);
    assert!(result.is_empty());
    assert!(result.times.is_empty());
}

#[test]
fn iso_dates_format() {
    let result = merge_ranges("x", &[ParsedDateRange::single(d(2025, 3, 9))]);
    assert_eq!(result.iso_dates(), vec!["2025-03-09"]);
}
