//! TOML configuration for the LLM-assisted tier.
//!
//! ```toml
//! [llm]
//! enabled = true
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-4o-mini"
//! timeout_secs = 5
//! retry_transient = true
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable consulted when `llm.api_key` is not set.
pub const API_KEY_ENV: &str = "DATEPOLL_API_KEY";

const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 30;
const MAX_RETRY_DELAY_MS: u64 = 2000;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.llm.validate()
    }
}

/// Settings for the OpenAI-compatible text-generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// The LLM tier is skipped entirely unless this is set.
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    /// Falls back to `DATEPOLL_API_KEY` when unset.
    pub api_key: Option<String>,
    /// Hard bound on one call, 1 to 30 seconds.
    pub timeout_secs: u64,
    /// Retry once on transport failure or timeout.
    pub retry_transient: bool,
    pub retry_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: 5,
            retry_transient: false,
            retry_delay_ms: 250,
        }
    }
}

impl LlmConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&self.timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "llm.timeout_secs must be between {} and {}, got {}",
                MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS, self.timeout_secs
            )));
        }
        if self.retry_delay_ms > MAX_RETRY_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "llm.retry_delay_ms must be at most {}, got {}",
                MAX_RETRY_DELAY_MS, self.retry_delay_ms
            )));
        }
        if self.enabled {
            if self.base_url.trim().is_empty() {
                return Err(ConfigError::Invalid("llm.base_url is empty".to_string()));
            }
            if self.model.trim().is_empty() {
                return Err(ConfigError::Invalid("llm.model is empty".to_string()));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// The configured key, or the environment fallback. Blank values count as unset.
    pub fn resolved_api_key(&self) -> Option<String> {
        let present = |key: &String| !key.trim().is_empty();
        self.api_key
            .clone()
            .filter(present)
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(present))
    }
}
