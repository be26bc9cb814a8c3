//! # AI Provider Factory
//!
//! Turns a named `ProviderConfig` entry into a live `AiProvider`. Any consumer of
//! the library (the server, tests, a one-off backfill) goes through this function,
//! so provider defaults are resolved in one place.

use crate::{
    constants::DEFAULT_ANTHROPIC_API_URL,
    errors::PromptError,
    providers::ai::{anthropic::AnthropicProvider, local::LocalAiProvider, AiProvider},
    types::ProviderConfig,
};
use tracing::info;

/// Creates an AI provider instance from its configuration entry.
pub fn create_provider(
    name: &str,
    config: &ProviderConfig,
) -> Result<Box<dyn AiProvider>, PromptError> {
    let provider: Box<dyn AiProvider> = match config.provider.as_str() {
        "anthropic" => {
            let api_key = config
                .api_key
                .clone()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| {
                    PromptError::MissingAiProvider(format!(
                        "api_key is required for anthropic provider '{name}'. Set ANTHROPIC_API_KEY."
                    ))
                })?;
            let api_url = config
                .api_url
                .clone()
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_API_URL.to_string());
            info!("Configuring Anthropic provider '{name}' with model '{}'", config.model_name);
            Box::new(AnthropicProvider::new(
                api_url,
                api_key,
                config.model_name.clone(),
            )?)
        }
        "local" => {
            // For local providers, the URL is always required.
            let api_url = config
                .api_url
                .clone()
                .filter(|url| !url.is_empty())
                .ok_or_else(|| {
                    PromptError::MissingAiProvider(format!(
                        "api_url is required for local provider '{name}'. Set LOCAL_AI_API_URL."
                    ))
                })?;
            info!("Configuring Local AI provider '{name}' with URL: {api_url}");
            Box::new(LocalAiProvider::new(
                api_url,
                config.api_key.clone(),
                Some(config.model_name.clone()),
            )?)
        }
        other => return Err(PromptError::UnsupportedProvider(other.to_string())),
    };

    Ok(provider)
}
