//! # datepoll-core
//!
//! Candidate-date extraction for group event polls.
//!
//! Free text such as "Dinner on Jan 10, 17, 24 at 7:30pm" goes through a
//! deterministic grammar first. Only when the grammar finds nothing is the
//! text sent, sanitized and delimited, to an injected text-generation service
//! whose answer must clear a confidence gate. Weekend presets cover the
//! common "which weekend works?" polls without any parsing at all.
//!
//! ## Modules
//!
//! - [`deterministic`]: four-tier grammar parser, pure and offline
//! - [`expander`]: date ranges to concrete calendar days, capped
//! - [`presets`]: this weekend, next N weekends, quarterly weekends
//! - [`sanitizer`]: prompt construction with a data boundary
//! - [`llm`]: generator seam and response validation
//! - [`http`]: OpenAI-compatible generator
//! - [`reconciler`]: picks between the tiers
//! - [`api`]: ISO-string entry points
//! - [`config`]: TOML settings for the LLM tier
//! - [`error`]: error types

pub mod api;
pub mod config;
pub mod deterministic;
pub mod error;
pub mod expander;
mod grammar;
pub mod http;
pub mod llm;
pub mod presets;
pub mod reconciler;
pub mod sanitizer;
pub mod times;
pub mod types;

pub use api::{
    generate_next_weekends, generate_quarterly_weekends, generate_this_weekend,
    parse_date_from_natural_language, validate_input, MAX_INPUT_CHARS,
};
pub use config::{Config, LlmConfig};
pub use deterministic::{parse_deterministic, GrammarTier};
pub use error::{ConfigError, DateParseError, Result};
pub use expander::{expand_range, expand_ranges, merge_ranges, ExpandedDate, MAX_EXPANDED_DATES};
pub use http::OpenAiCompatibleGenerator;
pub use llm::{parse_llm_response, LlmParser, TextGenerator};
pub use presets::RecurrencePreset;
pub use reconciler::{
    Reconciler, Reconciliation, ResultSource, UnparsedReason, CONFIDENCE_THRESHOLD,
};
pub use sanitizer::{sanitize, SanitizedPrompt};
pub use types::{CanonicalParseResult, LlmParseResult, ParseContext, ParsedDateRange};
