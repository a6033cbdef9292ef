//! OpenAI-compatible chat-completions generator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LlmConfig, API_KEY_ENV};
use crate::error::{ConfigError, DateParseError, Result};
use crate::llm::TextGenerator;
use crate::sanitizer::SanitizedPrompt;

/// [`TextGenerator`] backed by `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiCompatibleGenerator {
    /// Build a generator from configuration, resolving the API key from the
    /// environment when the file does not carry one.
    pub fn from_config(config: &LlmConfig) -> std::result::Result<Self, ConfigError> {
        let api_key = config.resolved_api_key().ok_or_else(|| {
            ConfigError::Invalid(format!(
                "llm.api_key not set and {} env var not set",
                API_KEY_ENV
            ))
        })?;
        Self::new(&config.base_url, &config.model, &api_key, config.timeout())
    }

    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> std::result::Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Invalid(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleGenerator {
    async fn generate(&self, prompt: &SanitizedPrompt) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(%status, "chat completion response");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or(body);
            return Err(DateParseError::ExternalService(format!(
                "API error ({}): {}",
                status, message
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| self.transport_error(e))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                DateParseError::ExternalService("response carried no message content".to_string())
            })
    }
}

impl OpenAiCompatibleGenerator {
    fn transport_error(&self, e: reqwest::Error) -> DateParseError {
        if e.is_timeout() {
            DateParseError::Timeout(self.timeout)
        } else if e.is_connect() {
            DateParseError::ExternalService(format!("Connection failed: {}", e))
        } else if e.is_decode() {
            DateParseError::ExternalService(format!("Failed to parse response: {}", e))
        } else {
            DateParseError::ExternalService(format!("Request failed: {}", e))
        }
    }
}
