use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::GenerationSettings;
use crate::models::ConversationTurn;

/// Errors that can occur when calling the language-generation service
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),
}

/// A service that continues a conversation
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate the next assistant message for `turns`, capped at `max_tokens`
    async fn complete(&self, turns: &[ConversationTurn], max_tokens: u32) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint (Groq by default)
pub struct ChatCompletionsClient {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    top_p: f32,
    client: Client,
}

impl ChatCompletionsClient {
    /// Create a new client from generation settings
    pub fn new(settings: &GenerationSettings) -> Result<Self, GenerationError> {
        // The per-call deadline lives in the orchestrator; this is only a backstop
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.saturating_mul(2).max(1)))
            .build()?;

        Ok(Self {
            base_url: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            top_p: settings.top_p,
            client,
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LanguageModel for ChatCompletionsClient {
    async fn complete(&self, turns: &[ConversationTurn], max_tokens: u32) -> Result<String, GenerationError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: turns
                .iter()
                .map(|turn| CompletionMessage {
                    role: turn.role.as_str(),
                    content: &turn.content,
                })
                .collect(),
            temperature: self.temperature,
            max_tokens,
            top_p: self.top_p,
            stream: false,
        };

        tracing::debug!("Requesting completion from {} ({} turns)", self.model, turns.len());

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Completion request failed: {} - {}", status, body);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Unauthorized,
                StatusCode::TOO_MANY_REQUESTS => GenerationError::QuotaExceeded(body),
                _ => GenerationError::ApiError(format!("Completion failed: {}", status)),
            });
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(format!("Failed to parse completion: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| GenerationError::InvalidResponse("Missing choices[0].message.content".into()))
    }
}
