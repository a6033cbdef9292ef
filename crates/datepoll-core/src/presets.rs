//! Recurrence presets -- fixed-shape weekend schedules.
//!
//! A weekend is the Friday–Saturday–Sunday triple. Every generator is a pure
//! function of its arguments: no clock access, ascending output, no overlap
//! between triples.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Largest number of weekends `next_weekends` generates; larger counts are clamped.
pub const MAX_WEEKEND_COUNT: u32 = 52;

/// A named preset with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "preset", rename_all = "kebab-case")]
pub enum RecurrencePreset {
    ThisWeekend {
        upcoming_only: bool,
    },
    NextWeekends {
        count: u32,
        upcoming_only: bool,
    },
    QuarterlyWeekends,
}

impl RecurrencePreset {
    /// Evaluate the preset against `reference_date`.
    pub fn generate(&self, reference_date: NaiveDate) -> Vec<NaiveDate> {
        match *self {
            Self::ThisWeekend { upcoming_only } => this_weekend(reference_date, upcoming_only),
            Self::NextWeekends {
                count,
                upcoming_only,
            } => next_weekends(reference_date, count, upcoming_only),
            Self::QuarterlyWeekends => quarterly_weekends(reference_date),
        }
    }
}

/// The Friday–Sunday triple that starts on `friday`, if the calendar reaches
/// its Sunday.
fn weekend_from(friday: NaiveDate) -> Option<[NaiveDate; 3]> {
    let saturday = friday.succ_opt()?;
    Some([friday, saturday, saturday.succ_opt()?])
}

/// Friday of the weekend `this_weekend` would return.
fn weekend_friday(reference_date: NaiveDate, upcoming_only: bool) -> Option<NaiveDate> {
    let days_since_friday = match reference_date.weekday() {
        Weekday::Fri => Some(0),
        Weekday::Sat => Some(1),
        Weekday::Sun => Some(2),
        _ => None,
    };

    match days_since_friday {
        Some(back) if !upcoming_only => reference_date.checked_sub_signed(Duration::days(back)),
        _ => {
            // Strictly after the reference date: a Friday reference moves a full week.
            let ahead = (Weekday::Fri.num_days_from_monday() as i64
                - reference_date.weekday().num_days_from_monday() as i64
                + 7)
                % 7;
            let ahead = if ahead == 0 { 7 } else { ahead };
            reference_date.checked_add_signed(Duration::days(ahead))
        }
    }
}

/// The current weekend when `reference_date` is a Friday, Saturday or Sunday
/// and `upcoming_only` is false; otherwise the next weekend whose Friday is
/// strictly after `reference_date`.
///
/// Empty only when that weekend lies past [`NaiveDate::MAX`].
pub fn this_weekend(reference_date: NaiveDate, upcoming_only: bool) -> Vec<NaiveDate> {
    weekend_friday(reference_date, upcoming_only)
        .and_then(weekend_from)
        .map(|triple| triple.to_vec())
        .unwrap_or_default()
}

/// `n` consecutive weekends (3n dates), starting with [`this_weekend`].
///
/// `n` is clamped to [`MAX_WEEKEND_COUNT`].
pub fn next_weekends(reference_date: NaiveDate, n: u32, upcoming_only: bool) -> Vec<NaiveDate> {
    let Some(first) = weekend_friday(reference_date, upcoming_only) else {
        return Vec::new();
    };
    (0..i64::from(n.min(MAX_WEEKEND_COUNT)))
        .map_while(|week| {
            first
                .checked_add_signed(Duration::weeks(week))
                .and_then(weekend_from)
        })
        .flatten()
        .collect()
}

/// Every weekend whose Friday falls between `reference_date` and the last day
/// of the month two calendar months later, inclusive.
pub fn quarterly_weekends(reference_date: NaiveDate) -> Vec<NaiveDate> {
    let Some(horizon) = last_day_of_month_offset(reference_date, 2) else {
        return Vec::new();
    };

    let ahead = (Weekday::Fri.num_days_from_monday() as i64
        - reference_date.weekday().num_days_from_monday() as i64
        + 7)
        % 7;
    let mut next_friday = reference_date.checked_add_signed(Duration::days(ahead));

    let mut dates = Vec::new();
    while let Some(friday) = next_friday.filter(|f| *f <= horizon) {
        let Some(triple) = weekend_from(friday) else {
            break;
        };
        dates.extend(triple);
        next_friday = friday.checked_add_signed(Duration::weeks(1));
    }
    dates
}

/// Last day of the month `months` after the month containing `date`.
fn last_day_of_month_offset(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let month_index = date.month0() + months + 1;
    let year = date.year() + (month_index / 12) as i32;
    let first_of_following = NaiveDate::from_ymd_opt(year, month_index % 12 + 1, 1)?;
    first_of_following.pred_opt()
}
