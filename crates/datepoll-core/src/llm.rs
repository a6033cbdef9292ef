//! LLM-assisted parsing for text the grammar does not cover.
//!
//! The generator is an injected [`TextGenerator`]; this module owns the
//! response contract. A response either validates completely or is discarded
//! as a [`DateParseError::SchemaViolation`]. Nothing is partially accepted.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{DateParseError, Result};
use crate::expander::merge_ranges;
use crate::sanitizer::{sanitize, SanitizedPrompt};
use crate::times::normalize_time;
use crate::types::{CanonicalParseResult, LlmParseResult, ParseContext, ParsedDateRange};

/// Default bound on a single generation call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Sunday-first numbering used by integer weekdays on the wire.
const SUNDAY_FIRST: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// A service that turns a sanitized prompt into raw response text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &SanitizedPrompt) -> Result<String>;
}

// ── Wire contract ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct WireResult {
    title: String,
    confidence: f64,
    date_ranges: Vec<WireRange>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct WireRange {
    start: NaiveDate,
    end: NaiveDate,
    #[serde(default)]
    days_of_week: Option<Vec<WireWeekday>>,
    #[serde(default)]
    times: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireWeekday {
    Index(u8),
    Name(String),
}

impl WireWeekday {
    fn resolve(&self) -> Result<Weekday> {
        match self {
            Self::Index(i) => SUNDAY_FIRST.get(*i as usize).copied().ok_or_else(|| {
                DateParseError::SchemaViolation(format!("weekday index {} out of range", i))
            }),
            Self::Name(name) => name.trim().parse::<Weekday>().map_err(|_| {
                DateParseError::SchemaViolation(format!("unknown weekday {:?}", name))
            }),
        }
    }
}

impl WireRange {
    fn validate(self) -> Result<ParsedDateRange> {
        if self.start > self.end {
            return Err(DateParseError::SchemaViolation(format!(
                "range start {} is after end {}",
                self.start, self.end
            )));
        }

        let mut range = ParsedDateRange::new(self.start, self.end);

        if let Some(days) = self.days_of_week {
            if days.is_empty() {
                return Err(DateParseError::SchemaViolation(
                    "daysOfWeek is present but empty".to_string(),
                ));
            }
            let days = days
                .iter()
                .map(WireWeekday::resolve)
                .collect::<Result<Vec<_>>>()?;
            range = range.with_days(&days);
        }

        if let Some(times) = self.times {
            let times = times
                .iter()
                .map(|t| {
                    normalize_time(t).ok_or_else(|| {
                        DateParseError::SchemaViolation(format!("malformed time {:?}", t))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            range = range.with_times(&times);
        }

        Ok(range)
    }
}

/// Validate raw response text against the result contract.
///
/// One surrounding Markdown code fence is tolerated. Unknown keys, missing
/// keys, confidence outside `[0, 1]`, inverted ranges, empty or unknown
/// weekdays and malformed times all reject the whole response.
pub fn parse_llm_response(raw: &str) -> Result<LlmParseResult> {
    let body = strip_code_fence(raw);
    let wire: WireResult = serde_json::from_str(body)
        .map_err(|e| DateParseError::SchemaViolation(e.to_string()))?;

    if !wire.confidence.is_finite() || !(0.0..=1.0).contains(&wire.confidence) {
        return Err(DateParseError::SchemaViolation(format!(
            "confidence {} outside [0, 1]",
            wire.confidence
        )));
    }

    let date_ranges = wire
        .date_ranges
        .into_iter()
        .map(WireRange::validate)
        .collect::<Result<Vec<_>>>()?;

    Ok(LlmParseResult {
        title: wire.title.trim().to_string(),
        confidence: wire.confidence,
        date_ranges,
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    // Info string such as "json" on the opening fence.
    body.trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        .trim()
}

impl LlmParseResult {
    /// Expand into the canonical shape. A blank title falls back to `input`.
    pub fn to_canonical(&self, input: &str) -> CanonicalParseResult {
        let title = if self.title.is_empty() {
            input.trim()
        } else {
            self.title.as_str()
        };
        merge_ranges(title, &self.date_ranges)
    }
}

// ── Parser ──────────────────────────────────────────────────────────────────

/// Calls a [`TextGenerator`] under a timeout and validates what comes back.
pub struct LlmParser {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
    retry_delay: Option<Duration>,
}

impl LlmParser {
    /// A parser with the default timeout and no retry.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            timeout: DEFAULT_TIMEOUT,
            retry_delay: None,
        }
    }

    pub fn from_config(generator: Arc<dyn TextGenerator>, config: &LlmConfig) -> Self {
        let parser = Self::new(generator).with_timeout(config.timeout());
        if config.retry_transient {
            parser.with_retry(config.retry_delay())
        } else {
            parser
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retry once, after `delay`, when the first call fails transiently.
    pub fn with_retry(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sanitize `input`, call the generator, and validate the response.
    ///
    /// Makes one call, or two when retry is enabled and the first failed with
    /// a transport error or timeout. Schema violations are never retried.
    pub async fn parse(&self, input: &str, context: &ParseContext) -> Result<LlmParseResult> {
        let prompt = sanitize(input, context);

        match self.attempt(&prompt).await {
            Err(err) if err.is_transient() => match self.retry_delay {
                Some(delay) => {
                    warn!(error = %err, "text generation failed, retrying once");
                    tokio::time::sleep(delay).await;
                    self.attempt(&prompt).await
                }
                None => Err(err),
            },
            outcome => outcome,
        }
    }

    async fn attempt(&self, prompt: &SanitizedPrompt) -> Result<LlmParseResult> {
        let raw = tokio::time::timeout(self.timeout, self.generator.generate(prompt))
            .await
            .map_err(|_| DateParseError::Timeout(self.timeout))??;
        debug!(bytes = raw.len(), "received generation response");
        parse_llm_response(&raw)
    }
}
