//! Data model shared by both parser tiers.

use chrono::{Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// The "now" anchor for resolving relative expressions.
///
/// Every component takes the reference date explicitly so that identical
/// inputs always produce identical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseContext {
    pub reference_date: NaiveDate,
}

impl ParseContext {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    /// Context anchored on the local calendar date. Only boundary callers that
    /// were not handed a reference date should use this.
    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }
}

/// A contiguous span of dates, optionally restricted to some weekdays and
/// carrying times of day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Weekday filter. `None` means every day in the span.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<Weekday>>,
    /// "HH:MM" 24-hour times attached to every expanded date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub times: Option<Vec<String>>,
}

impl ParsedDateRange {
    /// A range covering every day from `start` to `end` inclusive.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            days_of_week: None,
            times: None,
        }
    }

    /// A range covering exactly one day.
    pub fn single(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// Restrict the range to `days`. Duplicates are dropped and the set is
    /// kept in Monday-first order; an empty slice leaves the range unrestricted.
    pub fn with_days(mut self, days: &[Weekday]) -> Self {
        let mut set: Vec<Weekday> = days.to_vec();
        set.sort_by_key(|d| d.num_days_from_monday());
        set.dedup();
        self.days_of_week = if set.is_empty() { None } else { Some(set) };
        self
    }

    /// Attach times; an empty slice leaves the range without times.
    pub fn with_times(mut self, times: &[String]) -> Self {
        self.times = if times.is_empty() {
            None
        } else {
            Some(times.to_vec())
        };
        self
    }
}

/// The shape every caller ultimately receives.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanonicalParseResult {
    pub title: String,
    /// Ascending, one entry per calendar day.
    pub dates: Vec<NaiveDate>,
    /// Deduplicated "HH:MM" strings in first-seen order.
    pub times: Vec<String>,
}

impl CanonicalParseResult {
    /// The explicit "could not parse" outcome: the raw input as title, no dates.
    pub fn unparsed(input: &str) -> Self {
        Self {
            title: input.to_string(),
            dates: Vec::new(),
            times: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Dates formatted as ISO-8601 calendar dates (`YYYY-MM-DD`).
    pub fn iso_dates(&self) -> Vec<String> {
        self.dates.iter().map(|d| d.to_string()).collect()
    }
}

/// Validated output of the LLM-assisted tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmParseResult {
    pub title: String,
    /// Extraction reliability in `[0.0, 1.0]`.
    pub confidence: f64,
    pub date_ranges: Vec<ParsedDateRange>,
}
