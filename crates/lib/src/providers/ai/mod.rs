pub mod anthropic;
pub mod local;

use crate::errors::PromptError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// The author of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A provider-neutral chat completion request.
///
/// The model identifier is not part of the request; each provider instance is
/// bound to the model it was configured with.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A trait for interacting with an AI provider.
///
/// Implementations return the text of the first content segment of the
/// response, or an empty string when the response does not have the expected
/// shape. Transport failures and non-success statuses are errors.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, PromptError>;
}

dyn_clone::clone_trait_object!(AiProvider);
