//! Range expansion -- converts `ParsedDateRange` values into concrete dates.
//!
//! Both parser tiers describe what they found as ranges and funnel them through
//! [`merge_ranges`], so the deterministic and LLM-assisted paths share one
//! output shape and one set of ordering rules.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::types::{CanonicalParseResult, ParsedDateRange};

/// Upper bound on the dates a single range may expand to. Wider ranges are
/// truncated, never rejected.
pub const MAX_EXPANDED_DATES: usize = 500;

/// One concrete date with the union of the times of every range that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedDate {
    pub date: NaiveDate,
    pub times: Vec<String>,
}

/// Expand a single range into its dates, ascending.
///
/// Without `days_of_week` every date in `[start, end]` is produced; with it only
/// dates whose weekday is in the set (both endpoints included). A range with
/// `start > end` produces nothing. At most [`MAX_EXPANDED_DATES`] dates are
/// returned.
pub fn expand_range(range: &ParsedDateRange) -> Vec<NaiveDate> {
    // An empty weekday set matches nothing.
    if range.days_of_week.as_ref().is_some_and(|d| d.is_empty()) {
        return Vec::new();
    }

    let mut dates = Vec::new();
    let mut current = Some(range.start);

    while let Some(date) = current {
        if date > range.end {
            break;
        }
        if dates.len() == MAX_EXPANDED_DATES {
            debug!(
                start = %range.start,
                end = %range.end,
                cap = MAX_EXPANDED_DATES,
                "range expansion truncated"
            );
            break;
        }

        let included = match &range.days_of_week {
            Some(days) => days.contains(&date.weekday()),
            None => true,
        };
        if included {
            dates.push(date);
        }
        current = date.succ_opt();
    }

    dates
}

/// Expand several ranges into a date-ordered schedule.
///
/// A date produced by more than one range appears once, carrying the union of
/// the ranges' times in first-seen order.
pub fn expand_ranges(ranges: &[ParsedDateRange]) -> Vec<ExpandedDate> {
    let mut schedule: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();

    for range in ranges {
        let times = range.times.as_deref().unwrap_or_default();
        for date in expand_range(range) {
            let slot = schedule.entry(date).or_default();
            for time in times {
                if !slot.contains(time) {
                    slot.push(time.clone());
                }
            }
        }
    }

    schedule
        .into_iter()
        .map(|(date, times)| ExpandedDate { date, times })
        .collect()
}

/// Merge ranges into the canonical result shape.
///
/// `dates` is ascending and deduplicated; `times` is deduplicated and keeps the
/// order in which the ranges list them.
pub fn merge_ranges(title: &str, ranges: &[ParsedDateRange]) -> CanonicalParseResult {
    let dates = expand_ranges(ranges).into_iter().map(|e| e.date).collect();

    let mut times: Vec<String> = Vec::new();
    for time in ranges.iter().flat_map(|r| r.times.iter().flatten()) {
        if !times.contains(time) {
            times.push(time.clone());
        }
    }

    CanonicalParseResult {
        title: title.to_string(),
        dates,
        times,
    }
}
