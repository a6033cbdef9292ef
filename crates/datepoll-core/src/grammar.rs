//! Vocabulary and compiled patterns for the deterministic parser.
//!
//! All patterns run against ASCII-lowercased input, so byte offsets in a match
//! are valid offsets into the original text as well.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;

// ── Fragments ───────────────────────────────────────────────────────────────

const MONTH: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

const ORDINAL_SUFFIX: &str = r"(?:st|nd|rd|th)?";

/// Single weekday names, full or abbreviated.
const WEEKDAY: &str = r"monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues?|wed|thu(?:rs?)?|fri|sat|sun";

/// Range connectors between two anchors.
const RANGE_CONNECTOR: &str = r"\s*(?:through|thru|to|until|till|-|–|—)\s*";

// ── Compiled patterns ───────────────────────────────────────────────────────

/// "jan 10", "january 10th, 17 and 24, 2025".
/// Groups: 1 month, 2 first day, 3 further days, 4 year.
pub(crate) static MONTH_DAY_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b({MONTH})\.?\s+(\d{{1,2}}){ORDINAL_SUFFIX}\b((?:\s*(?:,|&|\band\b|\bor\b)\s*\d{{1,2}}{ORDINAL_SUFFIX}\b)*)(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("Invalid regex")
});

/// A day inside the trailing list of `MONTH_DAY_LIST`.
pub(crate) static LIST_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})(?:st|nd|rd|th)?").expect("Invalid regex"));

/// "10 jan", "3rd of march 2025". Groups: 1 day, 2 month, 3 year.
pub(crate) static DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(\d{{1,2}}){ORDINAL_SUFFIX}\s+(?:of\s+)?({MONTH})\b\.?(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("Invalid regex")
});

/// "2025-01-10". Groups: 1 year, 2 month, 3 day.
pub(crate) static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("Invalid regex"));

/// "1/10", "1/10/25", "1/10/2025". Groups: 1 month, 2 day, 3 year.
pub(crate) static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b").expect("Invalid regex")
});

/// Weekday tokens, singular or plural, optionally introduced by "every"/"each".
/// Groups: 1 "every"/"each", 2 "other", 3 token.
pub(crate) static WEEKDAY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:(every|each)\s+(other\s+)?)?(mondays|tuesdays|wednesdays|thursdays|fridays|saturdays|sundays|weekends?|weekdays|{WEEKDAY})\b"
    ))
    .expect("Invalid regex")
});

/// "q1 2025", "q3". Groups: 1 quarter, 2 year.
pub(crate) static QUARTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bq([1-4])\b(?:\s*(\d{4})\b)?").expect("Invalid regex")
});

/// A month name used as a scope ("in march", "april 2025"). Groups: 1 month, 2 year.
pub(crate) static MONTH_SCOPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b({MONTH})\b\.?(?:\s+(\d{{4}})\b)?")).expect("Invalid regex")
});

/// Relative anchors. Groups: 1 whole anchor, 2 weekend count, 3 modifier, 4 weekday.
pub(crate) static RELATIVE_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(today|tonight|tomorrow|tmrw|this\s+weekend|next\s+weekend|next\s+(\d{{1,2}})\s+weekends|(?:(next|this)\s+)?({WEEKDAY}))\b"
    ))
    .expect("Invalid regex")
});

/// One anchor that may start or end a range.
fn anchor_fragment() -> String {
    format!(
        r"(?:(?:{MONTH})\.?\s+\d{{1,2}}{ORDINAL_SUFFIX}(?:,?\s+\d{{4}})?|\d{{1,2}}{ORDINAL_SUFFIX}\s+(?:of\s+)?(?:{MONTH})\.?(?:,?\s+\d{{4}})?|\d{{4}}-\d{{2}}-\d{{2}}|\d{{1,2}}/\d{{1,2}}(?:/\d{{2,4}})?|today|tomorrow|(?:(?:next|this)\s+)?(?:{WEEKDAY}))"
    )
}

/// "[from] A through B", "march 3-10". Groups: 1 left anchor, 2 right anchor.
pub(crate) static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    let anchor = anchor_fragment();
    Regex::new(&format!(
        r"\b(?:from\s+)?({anchor}){RANGE_CONNECTOR}({anchor}|\d{{1,2}}{ORDINAL_SUFFIX})\b"
    ))
    .expect("Invalid regex")
});

/// "between A and B". Groups: 1 left anchor, 2 right anchor.
pub(crate) static BETWEEN_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    let anchor = anchor_fragment();
    Regex::new(&format!(
        r"\bbetween\s+({anchor})\s+and\s+({anchor}|\d{{1,2}}{ORDINAL_SUFFIX})\b"
    ))
    .expect("Invalid regex")
});

/// Whole-string forms used to resolve a single range anchor.
static ANCHOR_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^({MONTH})\.?\s+(\d{{1,2}}){ORDINAL_SUFFIX}(?:,?\s+(\d{{4}}))?$"
    ))
    .expect("Invalid regex")
});
static ANCHOR_DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(\d{{1,2}}){ORDINAL_SUFFIX}\s+(?:of\s+)?({MONTH})\.?(?:,?\s+(\d{{4}}))?$"
    ))
    .expect("Invalid regex")
});
static ANCHOR_DAY_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(\d{{1,2}}){ORDINAL_SUFFIX}$")).expect("Invalid regex")
});

// ── Vocabulary ──────────────────────────────────────────────────────────────

/// Parse a weekday name: full, abbreviated or plural.
pub(crate) fn parse_weekday(s: &str) -> Option<Weekday> {
    match s.trim_end_matches('s') {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Weekdays denoted by a weekday token. "weekend" is the Friday–Sunday triple
/// used by the presets.
pub(crate) fn token_weekdays(token: &str) -> Vec<Weekday> {
    match token {
        "weekend" | "weekends" => vec![Weekday::Fri, Weekday::Sat, Weekday::Sun],
        "weekdays" => vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ],
        other => parse_weekday(other).into_iter().collect(),
    }
}

/// Plural tokens ("fridays", "weekends") imply recurrence on their own.
pub(crate) fn is_plural_token(token: &str) -> bool {
    token.ends_with("days") || token == "weekends"
}

/// Parse a month name or abbreviation to its number (1-12).
pub(crate) fn parse_month(s: &str) -> Option<u32> {
    let s = s.trim_end_matches('.');
    let month = match s.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parse a year capture: four digits as-is, two digits in the 2000s.
pub(crate) fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    match s.len() {
        2 => Some(2000 + year),
        4 => Some(year),
        _ => None,
    }
}

// ── Calendar helpers ────────────────────────────────────────────────────────

/// First and last day of `month` in `year`.
pub(crate) fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

/// First and last day of quarter `q` (1-4) in `year`.
pub(crate) fn quarter_bounds(year: i32, q: u32) -> Option<(NaiveDate, NaiveDate)> {
    if !(1..=4).contains(&q) {
        return None;
    }
    let first_month = (q - 1) * 3 + 1;
    let (start, _) = month_bounds(year, first_month)?;
    let (_, end) = month_bounds(year, first_month + 2)?;
    Some((start, end))
}

/// Days from `from` until the next `weekday`, in `0..=6`.
pub(crate) fn days_until(from: NaiveDate, weekday: Weekday) -> i64 {
    (weekday.num_days_from_monday() as i64 - from.weekday().num_days_from_monday() as i64 + 7) % 7
}

/// "next <weekday>": strictly after `reference`, 1..=7 days ahead.
pub(crate) fn next_weekday(reference: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let ahead = days_until(reference, weekday);
    reference.checked_add_signed(Duration::days(if ahead == 0 { 7 } else { ahead }))
}

/// "this <weekday>" or a bare weekday: the upcoming occurrence, today included.
pub(crate) fn upcoming_weekday(reference: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    reference.checked_add_signed(Duration::days(days_until(reference, weekday)))
}

/// Abbreviated singular weekday names ("sat", "sun", "wed") double as
/// ordinary words.
pub(crate) fn is_bare_abbreviation(token: &str) -> bool {
    !token.ends_with("day") && !token.ends_with("days") && !token.starts_with("weekend")
}

/// Resolve a year-less month/day against the reference year.
pub(crate) fn month_day_in_reference_year(
    reference: NaiveDate,
    month: u32,
    day: u32,
) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(reference.year(), month, day)
}

// ── Range anchors ───────────────────────────────────────────────────────────

/// A resolved range endpoint, remembering how it was written.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Anchor {
    pub date: NaiveDate,
    /// The text named a year (or needed none, like "tomorrow").
    pub explicit_year: bool,
    /// Resolved relative to the reference date ("today", "next friday").
    pub relative: bool,
    /// A bare day number borrowing the left anchor's month.
    pub day_only: bool,
}

/// Resolve one range endpoint. `left` supplies the month for a bare day
/// number on the right-hand side ("march 3-10").
pub(crate) fn resolve_anchor(text: &str, reference: NaiveDate, left: Option<Anchor>) -> Option<Anchor> {
    let text = text.trim();

    if let Some(caps) = ANCHOR_MONTH_DAY.captures(text) {
        let month = parse_month(&caps[1])?;
        let day: u32 = caps[2].parse().ok()?;
        return month_day_anchor(reference, month, day, caps.get(3).map(|m| m.as_str()));
    }
    if let Some(caps) = ANCHOR_DAY_MONTH.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month = parse_month(&caps[2])?;
        return month_day_anchor(reference, month, day, caps.get(3).map(|m| m.as_str()));
    }
    if let Some(caps) = ISO_DATE.captures(text) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        return Some(Anchor {
            date,
            explicit_year: true,
            relative: false,
            day_only: false,
        });
    }
    if let Some(caps) = NUMERIC_DATE.captures(text) {
        let month: u32 = caps[1].parse().ok()?;
        let day: u32 = caps[2].parse().ok()?;
        return month_day_anchor(reference, month, day, caps.get(3).map(|m| m.as_str()));
    }
    if let Some(caps) = ANCHOR_DAY_ONLY.captures(text) {
        // Only a calendar anchor lends its month ("march 3-10", not "friday - 10").
        let left = left.filter(|l| !l.relative)?;
        let day: u32 = caps[1].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(left.date.year(), left.date.month(), day)?;
        return Some(Anchor {
            date,
            explicit_year: left.explicit_year,
            relative: false,
            day_only: true,
        });
    }

    let date = match text {
        "today" => reference,
        "tomorrow" => reference.succ_opt()?,
        _ => {
            let (modifier, name) = match text.split_once(char::is_whitespace) {
                Some((m, rest)) => (Some(m), rest.trim()),
                None => (None, text),
            };
            let weekday = parse_weekday(name)?;
            match modifier {
                Some("next") => next_weekday(reference, weekday)?,
                Some("this") | None => upcoming_weekday(reference, weekday)?,
                Some(_) => return None,
            }
        }
    };
    Some(Anchor {
        date,
        explicit_year: true,
        relative: true,
        day_only: false,
    })
}

fn month_day_anchor(
    reference: NaiveDate,
    month: u32,
    day: u32,
    year: Option<&str>,
) -> Option<Anchor> {
    match year {
        Some(y) => Some(Anchor {
            date: NaiveDate::from_ymd_opt(parse_year(y)?, month, day)?,
            explicit_year: true,
            relative: false,
            day_only: false,
        }),
        None => Some(Anchor {
            date: month_day_in_reference_year(reference, month, day)?,
            explicit_year: false,
            relative: false,
            day_only: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_names_and_abbreviations() {
        assert_eq!(parse_month("jan"), Some(1));
        assert_eq!(parse_month("september"), Some(9));
        assert_eq!(parse_month("sept"), Some(9));
        assert_eq!(parse_month("dec."), Some(12));
        assert_eq!(parse_month("ma"), None);
        assert_eq!(parse_month("foo"), None);
    }

    #[test]
    fn weekday_tokens() {
        assert_eq!(parse_weekday("fridays"), Some(Weekday::Fri));
        assert_eq!(parse_weekday("tues"), Some(Weekday::Tue));
        assert_eq!(parse_weekday("thurs"), Some(Weekday::Thu));
        assert_eq!(token_weekdays("weekends").len(), 3);
        assert_eq!(token_weekdays("weekdays").len(), 5);
        assert!(is_plural_token("saturdays"));
        assert!(!is_plural_token("tues"));
        assert!(!is_plural_token("friday"));
        assert!(is_bare_abbreviation("sun"));
        assert!(is_bare_abbreviation("thurs"));
        assert!(!is_bare_abbreviation("sunday"));
        assert!(!is_bare_abbreviation("weekend"));
        assert!(!is_bare_abbreviation("weekdays"));
    }

    #[test]
    fn quarter_bounds_cover_three_months() {
        assert_eq!(quarter_bounds(2025, 1), Some((d(2025, 1, 1), d(2025, 3, 31))));
        assert_eq!(quarter_bounds(2024, 4), Some((d(2024, 10, 1), d(2024, 12, 31))));
        assert_eq!(quarter_bounds(2024, 5), None);
    }

    #[test]
    fn next_and_upcoming_weekday() {
        // 2025-01-08 is a Wednesday.
        let wed = d(2025, 1, 8);
        assert_eq!(next_weekday(wed, Weekday::Wed), Some(d(2025, 1, 15)));
        assert_eq!(next_weekday(wed, Weekday::Fri), Some(d(2025, 1, 10)));
        assert_eq!(upcoming_weekday(wed, Weekday::Wed), Some(wed));
        assert_eq!(upcoming_weekday(wed, Weekday::Mon), Some(d(2025, 1, 13)));
    }

    #[test]
    fn weekday_arithmetic_stops_at_the_calendar_end() {
        let last = NaiveDate::MAX;
        assert_eq!(upcoming_weekday(last, last.weekday()), Some(last));
        assert_eq!(next_weekday(last, last.weekday()), None);
        assert_eq!(upcoming_weekday(last, last.weekday().succ()), None);
    }

    #[test]
    fn anchors_resolve_against_reference() {
        let reference = d(2025, 1, 8);
        let left = resolve_anchor("march 3", reference, None).unwrap();
        assert_eq!(left.date, d(2025, 3, 3));
        assert!(!left.explicit_year);

        let right = resolve_anchor("10th", reference, Some(left)).unwrap();
        assert_eq!(right.date, d(2025, 3, 10));
        assert!(right.day_only);

        assert_eq!(resolve_anchor("tomorrow", reference, None).unwrap().date, d(2025, 1, 9));
        assert_eq!(
            resolve_anchor("next friday", reference, None).unwrap().date,
            d(2025, 1, 10)
        );
        assert_eq!(
            resolve_anchor("2025-02-01", reference, None).unwrap().date,
            d(2025, 2, 1)
        );
        assert!(resolve_anchor("10", reference, None).is_none());
    }
}
