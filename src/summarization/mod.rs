//! Financial summary generation via a hosted chat-completions model.
//!
//! The client speaks the OpenAI-compatible `/chat/completions` protocol, which Groq (the default
//! provider) and most hosted LLM gateways expose. Extracted bill text is embedded into a fixed
//! prompt and sent as a single user message; the first choice's content is returned verbatim.

pub mod prompt;

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

pub use prompt::build_prompt;

/// Errors surfaced while generating a financial summary.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The HTTP client could not be constructed.
    #[error("Error generating financial summary: failed to build HTTP client: {0}")]
    ClientSetup(String),
    /// Provider was unreachable.
    #[error("Error generating financial summary: {0}")]
    ProviderUnavailable(String),
    /// Provider answered with a non-success status.
    #[error("Error generating financial summary: provider returned {status}: {body}")]
    Rejected {
        /// HTTP status returned by the provider.
        status: u16,
        /// Response body, as returned.
        body: String,
    },
    /// Provider response could not be interpreted.
    #[error("Error generating financial summary: malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by summary providers.
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    /// Produce a plain-text financial analysis of the extracted bill text.
    async fn generate_summary(&self, extracted_text: &str) -> Result<String, GenerationError>;
}

/// Chat-completions client for OpenAI-compatible providers.
pub struct ChatCompletionClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatCompletionClient {
    /// Build a client for the given API root, credential, and model settings.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Result<Self, GenerationError> {
        let http = Client::builder()
            .user_agent(concat!("finsight/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| GenerationError::ClientSetup(error.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        })
    }

    /// Build a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        Self::new(
            &config.llm_base_url,
            &config.llm_api_key,
            &config.llm_model,
            config.llm_temperature,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl SummaryGenerator for ChatCompletionClient {
    async fn generate_summary(&self, extracted_text: &str) -> Result<String, GenerationError> {
        let payload = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "user", "content": build_prompt(extracted_text) }
            ],
        });

        tracing::debug!(model = %self.model, chars = extracted_text.len(), "Requesting summary");
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                GenerationError::ProviderUnavailable(format!(
                    "failed to reach {}: {error}",
                    self.base_url
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            GenerationError::InvalidResponse(format!("failed to decode response: {error}"))
        })?;

        let choice = body.choices.into_iter().next().ok_or_else(|| {
            GenerationError::InvalidResponse("response contained no choices".into())
        })?;
        choice.message.content.ok_or_else(|| {
            GenerationError::InvalidResponse("first choice has no message content".into())
        })
    }
}
