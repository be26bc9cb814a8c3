use crate::{
    constants::ANTHROPIC_API_VERSION,
    errors::PromptError,
    providers::ai::{AiProvider, ChatMessage, CompletionRequest},
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;
use tracing::debug;

// --- Messages API request structures ---

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

// --- Anthropic Provider implementation ---

/// A provider for the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: String,
    model: String,
}

impl Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl AnthropicProvider {
    /// Creates a new `AnthropicProvider`.
    pub fn new(api_url: String, api_key: String, model: String) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }
}

/// Pulls `content[0].text` out of a Messages API response.
fn first_text_segment(body: &Value) -> String {
    body.get("content")
        .and_then(Value::as_array)
        .and_then(|segments| segments.first())
        .filter(|segment| segment.get("type").and_then(Value::as_str).unwrap_or("text") == "text")
        .and_then(|segment| segment.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, PromptError> {
        let body = MessagesRequest {
            model: &self.model,
            system: &request.system,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(model = %self.model, turns = request.messages.len(), "--> Sending messages request");

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let raw = response
            .text()
            .await
            .map_err(PromptError::AiDeserialization)?;
        let parsed: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);

        Ok(first_text_segment(&parsed))
    }
}
