//! Time-of-day scanning.
//!
//! Recognizes `7pm`, `7:30 pm`, `7:30 p.m.`, 24-hour `19:30`, "noon" and
//! "midnight" anywhere in the text, normalizing each to `HH:MM`.

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

/// Groups: 1 hour, 2 minute, 3 meridiem (12-hour form); 4 hour, 5 minute
/// (24-hour form); 6 named time.
static TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:(\d{1,2})(?::([0-5]\d))?\s*(a\.m\.|p\.m\.|am\b|pm\b)|([01]?\d|2[0-3]):([0-5]\d)\b|(noon|midnight)\b)",
    )
    .expect("Invalid regex")
});

/// A time found in the input, with its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeMatch {
    /// Normalized "HH:MM".
    pub time: String,
    pub start: usize,
    pub end: usize,
}

/// Scan `text` for times, in order of appearance. Duplicates are kept so the
/// caller sees every span; use [`extract_times`] for the deduplicated list.
pub fn scan_times(text: &str) -> Vec<TimeMatch> {
    let lower = text.to_ascii_lowercase();
    TIME.captures_iter(&lower)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let time = if let Some(hour) = caps.get(1) {
                let hour: u32 = hour.as_str().parse().ok()?;
                let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
                let pm = caps.get(3)?.as_str().starts_with('p');
                to_24_hour(hour, minute, pm)?
            } else if let Some(hour) = caps.get(4) {
                NaiveTime::from_hms_opt(hour.as_str().parse().ok()?, caps[5].parse().ok()?, 0)?
            } else {
                match caps.get(6)?.as_str() {
                    "noon" => NaiveTime::from_hms_opt(12, 0, 0)?,
                    _ => NaiveTime::from_hms_opt(0, 0, 0)?,
                }
            };
            Some(TimeMatch {
                time: format_time(time),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Every distinct time in `text`, normalized, in first-seen order.
pub fn extract_times(text: &str) -> Vec<String> {
    let mut times: Vec<String> = Vec::new();
    for m in scan_times(text) {
        if !times.contains(&m.time) {
            times.push(m.time);
        }
    }
    times
}

/// Normalize a loosely written time ("7:30", "07:30:00", "19:30") to "HH:MM".
/// Returns `None` for anything that is not a valid 24-hour time.
pub fn normalize_time(s: &str) -> Option<String> {
    let s = s.trim();
    ["%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
        .map(format_time)
}

fn to_24_hour(hour: u32, minute: u32, pm: bool) -> Option<NaiveTime> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour24 = match (hour, pm) {
        (12, true) => 12,
        (12, false) => 0,
        (h, true) => h + 12,
        (h, false) => h,
    };
    NaiveTime::from_hms_opt(hour24, minute, 0)
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
