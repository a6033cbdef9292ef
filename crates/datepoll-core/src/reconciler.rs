//! Two-tier orchestration: grammar first, LLM only on a miss.
//!
//! The reconciler is the only place tier failures are handled. Whatever goes
//! wrong below it, the caller gets a [`CanonicalParseResult`]; when nothing
//! trustworthy was found that result is the raw input with no dates.

use tracing::{debug, info, warn};

use crate::deterministic::match_grammar;
use crate::llm::LlmParser;
use crate::types::{CanonicalParseResult, ParseContext};

/// LLM results below this confidence are discarded.
pub const CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Where a call ended up. Every call starts `Deterministic`; a grammar miss
/// moves it to `Escalated`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    Deterministic,
    Escalated,
}

/// Why a call produced no dates.
#[derive(Debug, Clone, PartialEq)]
pub enum UnparsedReason {
    EmptyInput,
    /// No text generator is configured.
    NoGenerator,
    LowConfidence(f64),
    /// The generator answered confidently but nothing expanded to a date.
    NoDates,
    /// Transport error, timeout, or schema violation.
    Failed(String),
}

/// Which tier produced the result.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultSource {
    Deterministic,
    Llm { confidence: f64 },
    Unparsed { reason: UnparsedReason },
}

/// A canonical result together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub result: CanonicalParseResult,
    pub source: ResultSource,
}

impl Reconciliation {
    pub fn state(&self) -> ReconcilerState {
        match self.source {
            ResultSource::Deterministic => ReconcilerState::Deterministic,
            _ => ReconcilerState::Escalated,
        }
    }

    fn unparsed(input: &str, reason: UnparsedReason) -> Self {
        Self {
            result: CanonicalParseResult::unparsed(input.trim()),
            source: ResultSource::Unparsed { reason },
        }
    }
}

/// Runs the grammar, and the LLM tier when one is configured.
pub struct Reconciler {
    llm: Option<LlmParser>,
}

impl Reconciler {
    pub fn new(llm: Option<LlmParser>) -> Self {
        Self { llm }
    }

    /// A reconciler whose escalation path always ends unparsed.
    pub fn deterministic_only() -> Self {
        Self::new(None)
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    /// Parse `input`, reporting which tier answered.
    ///
    /// A grammar hit returns without touching the generator. Without a
    /// context the local calendar date is the reference.
    pub async fn reconcile(&self, input: &str, context: Option<&ParseContext>) -> Reconciliation {
        let context = context.copied().unwrap_or_else(ParseContext::today);

        if input.trim().is_empty() {
            return Reconciliation::unparsed(input, UnparsedReason::EmptyInput);
        }

        if let Some(found) = match_grammar(input, &context) {
            debug!(tier = ?found.tier, "deterministic tier answered, generator not called");
            return Reconciliation {
                result: found.result,
                source: ResultSource::Deterministic,
            };
        }

        let Some(llm) = &self.llm else {
            debug!("grammar missed and no text generator is configured");
            return Reconciliation::unparsed(input, UnparsedReason::NoGenerator);
        };

        info!("grammar missed, escalating to text generation");
        let parsed = match llm.parse(input, &context).await {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "text generation tier failed");
                return Reconciliation::unparsed(input, UnparsedReason::Failed(err.to_string()));
            }
        };

        if parsed.confidence < CONFIDENCE_THRESHOLD {
            warn!(
                confidence = parsed.confidence,
                "discarding low-confidence generation result"
            );
            return Reconciliation::unparsed(
                input,
                UnparsedReason::LowConfidence(parsed.confidence),
            );
        }

        let result = parsed.to_canonical(input);
        if result.is_empty() {
            warn!("confident generation result expanded to no dates");
            return Reconciliation::unparsed(input, UnparsedReason::NoDates);
        }

        Reconciliation {
            result,
            source: ResultSource::Llm {
                confidence: parsed.confidence,
            },
        }
    }

    /// Full two-tier parse. Never fails: an unresolved input comes back as
    /// its own title with empty `dates` and `times`.
    pub async fn parse_event_description_smart(
        &self,
        input: &str,
        context: Option<&ParseContext>,
    ) -> CanonicalParseResult {
        self.reconcile(input, context).await.result
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::deterministic_only()
    }
}
