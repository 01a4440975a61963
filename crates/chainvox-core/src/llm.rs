//! ============================================================================
//! Language Model Client - OpenAI-Compatible Chat Completions
//! ============================================================================
//! Sends a caller-assembled message sequence (system + prior turns + current
//! turn) and returns the first choice's text. The client never truncates
//! history and never invents content: every failure becomes an `LmError`.
//! ============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::retry::{with_retry, RetryConfig};
use crate::session::ChatTurn;
use crate::types::LmError;

/// Chat-completion backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete the conversation, returning the assistant's reply
    async fn complete(&self, messages: &[ChatTurn]) -> Result<String, LmError>;
}

/// HTTP client for `POST {base_url}/chat/completions`
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry: RetryConfig,
}

impl OpenAiClient {
    pub fn new(config: &ModelConfig, retry: RetryConfig) -> Result<Self, LmError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LmError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        info!("Language model client: {} via {}", config.model, config.base_url);

        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            retry,
        })
    }

    async fn call_api(&self, api_key: &str, request: &ChatRequest<'_>) -> Result<String, LmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LmError::Unavailable(format!("request timed out: {}", e))
                } else {
                    LmError::Unavailable(format!("failed to call chat API: {}", e))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LmError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LmError::Unavailable(format!(
                "chat API error {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LmError::Unavailable(format!("failed to read chat API response: {}", e)))?;

        parse_completion(&body)
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, messages: &[ChatTurn]) -> Result<String, LmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LmError::Unavailable("no API key configured".to_string()))?;

        debug!("Calling chat API with {} messages", messages.len());

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        };

        with_retry(&self.retry, "chat completion", || self.call_api(api_key, &request)).await
    }
}

/// Extract the first choice's content from a chat-completions body
pub fn parse_completion(body: &str) -> Result<String, LmError> {
    let chat_response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LmError::MalformedResponse(format!("failed to parse API response: {}", e)))?;

    chat_response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| LmError::MalformedResponse("no choices in response".to_string()))
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
