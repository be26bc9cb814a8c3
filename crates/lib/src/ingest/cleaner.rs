//! # Text Cleaner
//!
//! One completion request per document: the cleanup system prompt, the three
//! few-shot pairs, then the raw consolidated text.

use crate::{
    constants::{CLEANER_MAX_TOKENS, CLEANER_TEMPERATURE},
    ingest::IngestError,
    prompts::{build_cleanup_messages, CLEANUP_SYSTEM_PROMPT},
    providers::ai::{AiProvider, CompletionRequest},
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Sampling parameters for the cleanup request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanerSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CleanerSettings {
    fn default() -> Self {
        Self {
            temperature: CLEANER_TEMPERATURE,
            max_tokens: CLEANER_MAX_TOKENS,
        }
    }
}

/// Cleans consolidated document text with a language model.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    provider: Arc<dyn AiProvider>,
    settings: CleanerSettings,
}

impl TextCleaner {
    pub fn new(provider: Arc<dyn AiProvider>, settings: CleanerSettings) -> Self {
        Self { provider, settings }
    }

    /// The exact request sent for `raw_text`.
    pub fn build_request(&self, raw_text: &str) -> CompletionRequest {
        CompletionRequest {
            system: CLEANUP_SYSTEM_PROMPT.to_string(),
            messages: build_cleanup_messages(raw_text),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }

    /// Returns the cleaned text, or an empty string when the provider's response
    /// had no usable text. Provider failures are returned as `Upstream` errors and
    /// it is up to the caller to fall back.
    #[instrument(skip(self, raw_text), fields(raw_len = raw_text.len()))]
    pub async fn clean(&self, raw_text: &str) -> Result<String, IngestError> {
        let request = self.build_request(raw_text);
        let cleaned = self
            .provider
            .complete(&request)
            .await
            .map_err(|e| IngestError::Upstream(format!("Text cleanup failed: {e}")))?;
        debug!(cleaned_len = cleaned.len(), "<-- Cleaned text received");
        Ok(cleaned)
    }
}
