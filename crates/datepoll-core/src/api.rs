//! String-level entry points.
//!
//! These wrap the typed modules for callers that deal in ISO date strings. A
//! missing context falls back to the local calendar date.

use chrono::NaiveDate;

use crate::deterministic::parse_deterministic;
use crate::error::{DateParseError, Result};
use crate::presets;
use crate::types::ParseContext;

/// Longest accepted description, in characters, after trimming.
pub const MAX_INPUT_CHARS: usize = 200;

/// Check the documented input bound and return the trimmed text.
pub fn validate_input(input: &str) -> Result<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DateParseError::Validation("input is empty".to_string()));
    }
    let chars = trimmed.chars().count();
    if chars > MAX_INPUT_CHARS {
        return Err(DateParseError::Validation(format!(
            "input is {} characters, limit is {}",
            chars, MAX_INPUT_CHARS
        )));
    }
    Ok(trimmed)
}

/// Deterministic parse only; ISO dates, ascending. Never calls out.
pub fn parse_date_from_natural_language(input: &str, context: Option<&ParseContext>) -> Vec<String> {
    parse_deterministic(input, &resolve(context)).iso_dates()
}

pub fn generate_quarterly_weekends(reference_date: Option<NaiveDate>) -> Vec<String> {
    iso(presets::quarterly_weekends(reference(reference_date)))
}

/// `n` weekends as ISO dates; `n` above
/// [`MAX_WEEKEND_COUNT`](crate::presets::MAX_WEEKEND_COUNT) is clamped.
pub fn generate_next_weekends(
    n: u32,
    upcoming_only: bool,
    reference_date: Option<NaiveDate>,
) -> Vec<String> {
    iso(presets::next_weekends(reference(reference_date), n, upcoming_only))
}

pub fn generate_this_weekend(upcoming_only: bool, reference_date: Option<NaiveDate>) -> Vec<String> {
    iso(presets::this_weekend(reference(reference_date), upcoming_only))
}

fn resolve(context: Option<&ParseContext>) -> ParseContext {
    context.copied().unwrap_or_else(ParseContext::today)
}

fn reference(reference_date: Option<NaiveDate>) -> NaiveDate {
    reference_date.unwrap_or_else(|| ParseContext::today().reference_date)
}

fn iso(dates: Vec<NaiveDate>) -> Vec<String> {
    dates.iter().map(NaiveDate::to_string).collect()
}
