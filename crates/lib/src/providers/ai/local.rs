use crate::{
    errors::PromptError,
    providers::ai::{AiProvider, CompletionRequest},
};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;

// --- OpenAI-compatible request structures ---

#[derive(Serialize)]
struct LocalAiRequest<'a> {
    messages: Vec<LocalAiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct LocalAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

// --- Local Provider implementation ---

/// A provider for interacting with a local or OpenAI-compatible API.
#[derive(Clone, Debug)]
pub struct LocalAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl LocalAiProvider {
    /// Creates a new `LocalAiProvider`.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<Self, PromptError> {
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

#[async_trait]
impl AiProvider for LocalAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, PromptError> {
        // OpenAI-style APIs take the system prompt as the first message.
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(LocalAiMessage {
            role: "system",
            content: &request.system,
        });
        messages.extend(request.messages.iter().map(|m| LocalAiMessage {
            role: match m.role {
                super::ChatRole::User => "user",
                super::ChatRole::Assistant => "assistant",
            },
            content: &m.content,
        }));

        let request_body = LocalAiRequest {
            messages,
            model: self.model.as_deref(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let mut request_builder = self.client.post(&self.api_url);

        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .json(&request_body)
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

        let raw_response = parsed
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(raw_response)
    }
}
