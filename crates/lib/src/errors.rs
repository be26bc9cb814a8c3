use thiserror::Error;

/// Errors raised by the language model providers.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to read AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error ({status}): {body}")]
    AiApi { status: u16, body: String },
    #[error("AI provider is not configured correctly: {0}")]
    MissingAiProvider(String),
    #[error("Unsupported AI provider type: {0}")]
    UnsupportedProvider(String),
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
}
