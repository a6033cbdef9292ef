//! Error types for datepoll-core operations.
//!
//! A parse that finds no dates is not an error: it is a `CanonicalParseResult`
//! with empty `dates`. The variants below describe why a tier could not
//! answer, and never escape the [`Reconciler`](crate::reconciler::Reconciler).

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DateParseError {
    /// Input missing, empty, or longer than the documented bound.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Transport failure or non-success response from the text-generation service.
    #[error("Text generation service error: {0}")]
    ExternalService(String),

    /// The text-generation call did not finish in time.
    #[error("Text generation timed out after {0:?}")]
    Timeout(Duration),

    /// The response was not JSON of the expected shape.
    #[error("Response schema violation: {0}")]
    SchemaViolation(String),
}

impl DateParseError {
    /// Transient failures are worth one retry; contract violations are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ExternalService(_) | Self::Timeout(_))
    }
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, DateParseError>;
