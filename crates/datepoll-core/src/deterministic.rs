//! Deterministic pattern parser -- the offline fast path.
//!
//! Four grammar tiers are tried in order and the first that recognizes
//! anything wins:
//!
//! 1. [`GrammarTier::ExplicitDates`] -- "Jan 10, 17, 24", "2025-03-14", "3/14"
//! 2. [`GrammarTier::WeekdayQualifier`] -- "Fridays in March", "Q1 2025 Saturdays",
//!    "every Tuesday"
//! 3. [`GrammarTier::RelativeAnchor`] -- "tomorrow", "this weekend", "next Wednesday"
//! 4. [`GrammarTier::Range`] -- "March 3 through March 10", "between 4/1 and 4/5"
//!
//! Date tokens that are the endpoints of a range clause belong to tier 4 only,
//! so "March 3-10" is one range rather than two list dates.
//!
//! Times are scanned independently over the whole input and attached to every
//! date produced. Whatever the tier, the result goes through
//! [`merge_ranges`](crate::expander::merge_ranges).

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Captures;
use tracing::debug;

use crate::expander::{expand_range, merge_ranges};
use crate::grammar::{
    is_bare_abbreviation, is_plural_token, month_bounds, next_weekday, parse_month, parse_weekday, parse_year,
    quarter_bounds, resolve_anchor, token_weekdays, upcoming_weekday, BETWEEN_RANGE, DAY_MONTH,
    ISO_DATE, LIST_DAY, MONTH_DAY_LIST, MONTH_SCOPE, NUMERIC_DATE, QUARTER, RANGE,
    RELATIVE_ANCHOR, WEEKDAY_TOKEN,
};
use crate::presets::{self, MAX_WEEKEND_COUNT};
use crate::times::scan_times;
use crate::types::{CanonicalParseResult, ParseContext, ParsedDateRange};

/// Length of the forward window for "every <weekday>" with no explicit scope.
pub const DEFAULT_WINDOW_WEEKS: i64 = 12;

/// Which grammar tier recognized the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarTier {
    ExplicitDates,
    WeekdayQualifier,
    RelativeAnchor,
    Range,
}

/// A successful deterministic parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarMatch {
    pub tier: GrammarTier,
    pub result: CanonicalParseResult,
}

/// Parse `input` with the offline grammar.
///
/// Returns a result with empty `dates` (and the full input as title) when no
/// tier matches; that is the signal for the reconciler to escalate.
pub fn parse_deterministic(input: &str, context: &ParseContext) -> CanonicalParseResult {
    match match_grammar(input, context) {
        Some(found) => found.result,
        None => CanonicalParseResult::unparsed(input.trim()),
    }
}

/// Run the tiers and report which one matched.
pub fn match_grammar(input: &str, context: &ParseContext) -> Option<GrammarMatch> {
    let lower = input.to_ascii_lowercase();
    let reference = context.reference_date;

    let time_matches = scan_times(input);
    let time_spans: Vec<Span> = time_matches.iter().map(|t| Span::new(t.start, t.end)).collect();
    let mut times: Vec<String> = Vec::new();
    for t in time_matches {
        if !times.contains(&t.time) {
            times.push(t.time);
        }
    }

    let clauses = range_clauses(&lower, reference, &time_spans);

    let found = explicit_dates(&lower, reference, &clauses, &time_spans)
        .or_else(|| weekday_qualified(&lower, reference, &clauses))
        .or_else(|| relative_anchors(&lower, reference, &clauses))
        .or_else(|| range_tier(&lower, &clauses))?;

    let ranges: Vec<ParsedDateRange> = found
        .ranges
        .into_iter()
        .map(|r| r.with_times(&times))
        .collect();

    let first_token = time_spans
        .iter()
        .map(|s| s.start)
        .chain(std::iter::once(found.first_token))
        .min()
        .unwrap_or(found.first_token);
    let title = extract_title(input, first_token);

    let result = merge_ranges(&title, &ranges);
    if result.dates.is_empty() {
        return None;
    }

    debug!(tier = ?found.tier, dates = result.dates.len(), "grammar matched");
    Some(GrammarMatch {
        tier: found.tier,
        result,
    })
}

// ── Internals ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

impl Span {
    fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    fn overlaps_any(&self, others: &[Span]) -> bool {
        others.iter().any(|o| self.overlaps(o))
    }
}

/// Ranges recognized by one tier, and where its first token starts.
struct Found {
    tier: GrammarTier,
    ranges: Vec<ParsedDateRange>,
    first_token: usize,
}

/// A "<anchor> through <anchor>" clause.
struct RangeClause {
    span: Span,
    range: ParsedDateRange,
}

fn whole_span(caps: &Captures<'_>) -> Span {
    let m = caps.get(0).expect("group 0 always participates");
    Span::new(m.start(), m.end())
}

/// The word immediately before byte offset `at`, if any.
fn preceding_word(lower: &str, at: usize) -> Option<&str> {
    lower[..at]
        .trim_end()
        .rsplit(|c: char| !c.is_ascii_alphanumeric())
        .next()
        .filter(|w| !w.is_empty())
}

/// Shift `date` by whole years, keeping month and day.
fn add_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    date.with_year(date.year() + years)
}

// ── Tier 1: explicit dates ──────────────────────────────────────────────────

/// Month/day pairs sharing one optional year, resolved together.
struct DateGroup {
    month_days: Vec<(u32, u32)>,
    year: Option<i32>,
}

impl DateGroup {
    /// A year-less group rolls to next year when its last date already passed.
    fn resolve(&self, reference: NaiveDate) -> Vec<NaiveDate> {
        let in_year = |year: i32| -> Vec<NaiveDate> {
            self.month_days
                .iter()
                .filter_map(|&(m, d)| NaiveDate::from_ymd_opt(year, m, d))
                .collect()
        };

        match self.year {
            Some(year) => in_year(year),
            None => {
                let dates = in_year(reference.year());
                match dates.iter().max() {
                    Some(last) if *last < reference => in_year(reference.year() + 1),
                    _ => dates,
                }
            }
        }
    }
}

fn explicit_dates(
    lower: &str,
    reference: NaiveDate,
    clauses: &[RangeClause],
    time_spans: &[Span],
) -> Option<Found> {
    let excluded: Vec<Span> = clauses.iter().map(|c| c.span).collect();
    let mut accepted: Vec<Span> = Vec::new();
    let mut groups: Vec<(Span, DateGroup)> = Vec::new();

    for caps in MONTH_DAY_LIST.captures_iter(lower) {
        let span = whole_span(&caps);
        if span.overlaps_any(&excluded) {
            continue;
        }
        let Some(month) = parse_month(&caps[1]) else {
            continue;
        };

        let mut days: Vec<u32> = caps[2].parse().ok().into_iter().collect();
        if let Some(rest) = caps.get(3) {
            for day in LIST_DAY.captures_iter(rest.as_str()) {
                let Some(m) = day.get(1) else {
                    continue;
                };
                let at = Span::new(rest.start() + m.start(), rest.start() + m.end());
                // "Jan 10, 7 pm": the 7 belongs to the time.
                if at.overlaps_any(time_spans) {
                    continue;
                }
                if let Ok(d) = m.as_str().parse() {
                    days.push(d);
                }
            }
        }

        accepted.push(span);
        groups.push((
            span,
            DateGroup {
                month_days: days.into_iter().map(|d| (month, d)).collect(),
                year: caps.get(4).and_then(|y| parse_year(y.as_str())),
            },
        ));
    }

    for caps in DAY_MONTH.captures_iter(lower) {
        let span = whole_span(&caps);
        if span.overlaps_any(&excluded) || span.overlaps_any(&accepted) {
            continue;
        }
        let (Ok(day), Some(month)) = (caps[1].parse::<u32>(), parse_month(&caps[2])) else {
            continue;
        };
        accepted.push(span);
        groups.push((
            span,
            DateGroup {
                month_days: vec![(month, day)],
                year: caps.get(3).and_then(|y| parse_year(y.as_str())),
            },
        ));
    }

    for caps in ISO_DATE.captures_iter(lower) {
        let span = whole_span(&caps);
        if span.overlaps_any(&excluded) || span.overlaps_any(&accepted) {
            continue;
        }
        let (Ok(year), Ok(month), Ok(day)) = (
            caps[1].parse::<i32>(),
            caps[2].parse::<u32>(),
            caps[3].parse::<u32>(),
        ) else {
            continue;
        };
        accepted.push(span);
        groups.push((
            span,
            DateGroup {
                month_days: vec![(month, day)],
                year: Some(year),
            },
        ));
    }

    for caps in NUMERIC_DATE.captures_iter(lower) {
        let span = whole_span(&caps);
        if span.overlaps_any(&excluded) || span.overlaps_any(&accepted) {
            continue;
        }
        let (Ok(month), Ok(day)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
            continue;
        };
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            continue;
        }
        accepted.push(span);
        groups.push((
            span,
            DateGroup {
                month_days: vec![(month, day)],
                year: caps.get(3).and_then(|y| parse_year(y.as_str())),
            },
        ));
    }

    // Groups that resolve to nothing ("feb 30") do not start the date text.
    let mut ranges: Vec<ParsedDateRange> = Vec::new();
    let mut first_token: Option<usize> = None;
    for (span, group) in &groups {
        let dates = group.resolve(reference);
        if dates.is_empty() {
            continue;
        }
        first_token = Some(first_token.map_or(span.start, |s| s.min(span.start)));
        ranges.extend(dates.into_iter().map(ParsedDateRange::single));
    }

    Some(Found {
        tier: GrammarTier::ExplicitDates,
        ranges,
        first_token: first_token?,
    })
}

// ── Tier 2: weekday with qualifier ──────────────────────────────────────────

/// Weekday tokens inside `within` and outside `excluded`, skipping "next
/// friday"/"this friday" which are relative anchors.
struct WeekdayTokens {
    days: Vec<Weekday>,
    recurring: bool,
    /// "every other friday".
    alternate: bool,
    first_start: Option<usize>,
}

fn weekday_tokens(lower: &str, excluded: &[Span], within: Span) -> WeekdayTokens {
    let mut tokens = WeekdayTokens {
        days: Vec::new(),
        recurring: false,
        alternate: false,
        first_start: None,
    };

    for caps in WEEKDAY_TOKEN.captures_iter(lower) {
        let span = whole_span(&caps);
        if span.start < within.start || span.end > within.end || span.overlaps_any(excluded) {
            continue;
        }
        let every = caps.get(1).is_some();
        let token = &caps[3];
        if !every {
            match preceding_word(lower, span.start) {
                Some("next" | "this") => continue,
                // "next 3 weekends" is a relative anchor.
                Some(w) if w.bytes().all(|b| b.is_ascii_digit()) => continue,
                _ => {}
            }
            // "fun in the sun", "we sat around".
            if is_bare_abbreviation(token) {
                continue;
            }
        }
        let days = token_weekdays(token);
        if days.is_empty() {
            continue;
        }

        tokens.days.extend(days);
        tokens.recurring |= every || is_plural_token(token);
        tokens.alternate |= caps.get(2).is_some();
        tokens.first_start = Some(tokens.first_start.map_or(span.start, |s| s.min(span.start)));
    }

    tokens
}

/// Keep every second week of the dates `ranges` cover, counted from the
/// first of them.
fn alternate_weeks(ranges: &[ParsedDateRange]) -> Vec<ParsedDateRange> {
    let mut dates: Vec<NaiveDate> = ranges.iter().flat_map(expand_range).collect();
    dates.sort();
    dates.dedup();

    let Some(&first) = dates.first() else {
        return Vec::new();
    };
    dates
        .into_iter()
        .filter(|date| (*date - first).num_days() / 7 % 2 == 0)
        .map(ParsedDateRange::single)
        .collect()
}

/// Scope of the weekday qualifier: quarters and months named in the input.
fn qualifier_scopes(lower: &str, reference: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let mut scopes = Vec::new();

    for caps in QUARTER.captures_iter(lower) {
        let Ok(q) = caps[1].parse::<u32>() else {
            continue;
        };
        let bounds = match caps.get(2).and_then(|y| parse_year(y.as_str())) {
            Some(year) => quarter_bounds(year, q),
            None => quarter_bounds(reference.year(), q).and_then(|(start, end)| {
                if end < reference {
                    quarter_bounds(reference.year() + 1, q)
                } else {
                    Some((start, end))
                }
            }),
        };
        scopes.extend(bounds);
    }

    for caps in MONTH_SCOPE.captures_iter(lower) {
        let span = whole_span(&caps);
        let name = &caps[1];
        let year = caps.get(2).and_then(|y| parse_year(y.as_str()));
        // "may" is usually the verb unless introduced or followed by a year.
        if name == "may"
            && year.is_none()
            && !matches!(
                preceding_word(lower, span.start),
                Some("in" | "during" | "of" | "for" | "through" | "until")
            )
        {
            continue;
        }
        let Some(month) = parse_month(name) else {
            continue;
        };
        let bounds = match year {
            Some(year) => month_bounds(year, month),
            None => month_bounds(reference.year(), month).and_then(|(start, end)| {
                if end < reference {
                    month_bounds(reference.year() + 1, month)
                } else {
                    Some((start, end))
                }
            }),
        };
        scopes.extend(bounds);
    }

    scopes
}

fn weekday_qualified(lower: &str, reference: NaiveDate, clauses: &[RangeClause]) -> Option<Found> {
    // A weekday scoped by an explicit range is handled by the range tier.
    if !clauses.is_empty() {
        return None;
    }

    let tokens = weekday_tokens(lower, &[], Span::new(0, lower.len()));
    let first_token = tokens.first_start?;

    let mut scopes = qualifier_scopes(lower, reference);
    if scopes.is_empty() {
        if !tokens.recurring {
            return None;
        }
        let end = reference
            .checked_add_signed(Duration::days(DEFAULT_WINDOW_WEEKS * 7 - 1))
            .unwrap_or(NaiveDate::MAX);
        scopes.push((reference, end));
    }

    let mut ranges: Vec<ParsedDateRange> = scopes
        .into_iter()
        .map(|(start, end)| ParsedDateRange::new(start, end).with_days(&tokens.days))
        .collect();
    if tokens.alternate {
        ranges = alternate_weeks(&ranges);
    }

    Some(Found {
        tier: GrammarTier::WeekdayQualifier,
        ranges,
        first_token,
    })
}

// ── Tier 3: relative anchors ────────────────────────────────────────────────

fn resolve_relative(caps: &Captures<'_>, reference: NaiveDate) -> Vec<NaiveDate> {
    let anchor = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");

    match anchor.as_str() {
        "today" | "tonight" => vec![reference],
        "tomorrow" | "tmrw" => reference.succ_opt().into_iter().collect(),
        "this weekend" => presets::this_weekend(reference, false),
        "next weekend" => presets::next_weekends(reference, 2, false)
            .into_iter()
            .skip(3)
            .collect(),
        _ => {
            if let Some(count) = caps.get(2) {
                return match count.as_str().parse::<u32>() {
                    Ok(n) if (1..=MAX_WEEKEND_COUNT).contains(&n) => {
                        presets::next_weekends(reference, n, false)
                    }
                    _ => Vec::new(),
                };
            }

            let Some(name) = caps.get(4).map(|m| m.as_str()) else {
                return Vec::new();
            };
            let Some(weekday) = parse_weekday(name) else {
                return Vec::new();
            };
            let date = match caps.get(3).map(|m| m.as_str()) {
                Some("next") => next_weekday(reference, weekday),
                Some(_) => upcoming_weekday(reference, weekday),
                // Bare abbreviations ("sat", "sun", "wed") are too often plain words.
                None if !is_bare_abbreviation(name) => upcoming_weekday(reference, weekday),
                None => None,
            };
            date.into_iter().collect()
        }
    }
}

fn relative_anchors(lower: &str, reference: NaiveDate, clauses: &[RangeClause]) -> Option<Found> {
    let excluded: Vec<Span> = clauses.iter().map(|c| c.span).collect();
    let mut ranges = Vec::new();
    let mut first_token: Option<usize> = None;

    for caps in RELATIVE_ANCHOR.captures_iter(lower) {
        let span = whole_span(&caps);
        if span.overlaps_any(&excluded) {
            continue;
        }
        let dates = resolve_relative(&caps, reference);
        if dates.is_empty() {
            continue;
        }
        first_token = Some(first_token.map_or(span.start, |s| s.min(span.start)));
        ranges.extend(dates.into_iter().map(ParsedDateRange::single));
    }

    Some(Found {
        tier: GrammarTier::RelativeAnchor,
        ranges,
        first_token: first_token?,
    })
}

// ── Tier 4: ranges ──────────────────────────────────────────────────────────

/// True when the text right after a range clause continues a time ("10 - 7:30pm").
fn continues_as_time(rest: &str) -> bool {
    let rest = rest.trim_start();
    rest.starts_with(':')
        || ["am", "pm", "a.m", "p.m"]
            .iter()
            .any(|m| rest.starts_with(m))
}

/// Find every range clause, resolving both endpoints.
fn range_clauses(lower: &str, reference: NaiveDate, time_spans: &[Span]) -> Vec<RangeClause> {
    let mut clauses: Vec<RangeClause> = Vec::new();

    for pattern in [&*RANGE, &*BETWEEN_RANGE] {
        for caps in pattern.captures_iter(lower) {
            let span = whole_span(&caps);
            let taken: Vec<Span> = clauses.iter().map(|c| c.span).collect();
            if span.overlaps_any(&taken) || span.overlaps_any(time_spans) {
                continue;
            }
            if continues_as_time(&lower[span.end..]) {
                continue;
            }
            if let Some(range) = resolve_range(&caps[1], &caps[2], reference) {
                clauses.push(RangeClause { span, range });
            }
        }
    }

    clauses.sort_by_key(|c| c.span.start);
    clauses
}

fn resolve_range(left: &str, right: &str, reference: NaiveDate) -> Option<ParsedDateRange> {
    let left = resolve_anchor(left, reference, None)?;
    let right = resolve_anchor(right, reference, Some(left))?;

    let mut start = left.date;
    let mut end = right.date;

    if end < start {
        if right.day_only {
            return None;
        } else if right.relative {
            while end < start {
                end = end.checked_add_signed(Duration::weeks(1))?;
            }
        } else if !right.explicit_year {
            end = add_years(end, 1)?;
        } else {
            return None;
        }
    }

    // A year-less calendar range already behind us means next year's.
    if !left.explicit_year && !left.relative && !right.explicit_year && end < reference {
        start = add_years(start, 1)?;
        end = add_years(end, 1)?;
    }

    Some(ParsedDateRange::new(start, end))
}

/// A '.' ends a sentence unless it closes an abbreviation ("p.m.", "mar.").
fn is_sentence_break(lower: &str, at: usize, c: char) -> bool {
    match c {
        '!' | '?' | ';' | '\n' => true,
        '.' => {
            let followed_by_space = lower[at + 1..]
                .chars()
                .next()
                .is_none_or(char::is_whitespace);
            let word = lower[..at]
                .rsplit(|c: char| !c.is_ascii_alphabetic())
                .next()
                .unwrap_or_default();
            let abbreviation = word.len() == 1
                || (word.len() <= 4
                    && (parse_month(word).is_some() || parse_weekday(word).is_some()));
            followed_by_space && !abbreviation
        }
        _ => false,
    }
}

/// The sentence containing `span`.
fn clause_bounds(lower: &str, span: Span) -> Span {
    let start = lower[..span.start]
        .char_indices()
        .rev()
        .find(|&(i, c)| is_sentence_break(lower, i, c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let end = lower[span.end..]
        .char_indices()
        .find(|&(i, c)| is_sentence_break(lower, span.end + i, c))
        .map_or(lower.len(), |(i, _)| span.end + i);
    Span::new(start, end)
}

/// Each clause takes the weekday qualifiers of its own sentence only.
fn range_tier(lower: &str, clauses: &[RangeClause]) -> Option<Found> {
    let first_clause = clauses.first()?;
    let excluded: Vec<Span> = clauses.iter().map(|c| c.span).collect();

    let mut ranges = Vec::new();
    let mut first_token = first_clause.span.start;
    for clause in clauses {
        let tokens = weekday_tokens(lower, &excluded, clause_bounds(lower, clause.span));
        let range = clause.range.clone().with_days(&tokens.days);
        if tokens.alternate {
            ranges.extend(alternate_weeks(&[range]));
        } else {
            ranges.push(range);
        }
        if let Some(start) = tokens.first_start {
            first_token = first_token.min(start);
        }
    }

    Some(Found {
        tier: GrammarTier::Range,
        ranges,
        first_token,
    })
}

// ── Title ───────────────────────────────────────────────────────────────────

const TRAILING_SEPARATORS: &[char] = &['-', '–', '—', ':', ',', '|', '@'];
const TRAILING_WORDS: &[&str] = &["on", "at", "from", "between", "every", "each", "in"];

/// Strip trailing separators and connective words from a title prefix.
fn trim_title(prefix: &str) -> &str {
    let mut title = prefix.trim_end();
    loop {
        let before = title.len();

        title = title.trim_end_matches(TRAILING_SEPARATORS).trim_end();

        for word in TRAILING_WORDS {
            let len = title.len();
            if len < word.len() || !title.is_char_boundary(len - word.len()) {
                continue;
            }
            let (head, tail) = title.split_at(len - word.len());
            let at_boundary = head.is_empty() || head.ends_with(char::is_whitespace);
            if at_boundary && tail.eq_ignore_ascii_case(word) {
                title = head.trim_end();
                break;
            }
        }

        if title.len() == before {
            return title;
        }
    }
}

/// The text before the first date/time token, or the whole input when
/// nothing meaningful precedes it.
fn extract_title(input: &str, first_token: usize) -> String {
    let prefix = input.get(..first_token).unwrap_or_default();
    let title = trim_title(prefix);
    if title.is_empty() {
        input.trim().to_string()
    } else {
        title.to_string()
    }
}
