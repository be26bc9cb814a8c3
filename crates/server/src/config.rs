//! # Application Configuration
//!
//! This module defines the configuration structure for the `sigmascholar-server`
//! and provides the logic for loading it from a `config.yml` file and environment
//! variables.

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;
use sigmascholar::{
    constants::{
        CLEANER_MAX_TOKENS, CLEANER_TEMPERATURE, DEFAULT_PARTITION_API_URL,
        DEFAULT_PUBSUB_API_URL, DEFAULT_STORAGE_API_URL, PROCESS_DOCUMENT_TOPIC,
    },
    types::ProviderConfig,
};
use crate::auth::FIREBASE_JWKS_URL;
use sigmascholar_firebase::FirestoreSettings;
use std::collections::HashMap;
use std::env;
use std::fs;
use tracing::info;

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub partition: PartitionConfig,
    pub cleaner: CleanerConfig,
    /// A map of named, reusable AI provider configurations.
    pub providers: HashMap<String, ProviderConfig>,
    pub firestore: FirestoreSettings,
    pub queue: QueueConfig,
    #[serde(default)]
    pub gcp: GcpConfig,
}

fn default_port() -> u16 {
    8080
}

/// How the trigger authenticates callers.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Firebase ID tokens (RS256, Google-published keys).
    #[default]
    Firebase,
    /// HS256 tokens signed with `jwt_secret`. Local runs and tests only.
    SharedSecret,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    /// Expected token audience. Falls back to `firestore.project_id`.
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_jwks_url")]
    pub jwks_url: String,
    /// HS256 secret for the `shared_secret` mode.
    #[serde(default)]
    pub jwt_secret: String,
}

fn default_jwks_url() -> String {
    FIREBASE_JWKS_URL.to_string()
}

/// Where uploaded files are read from.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    #[serde(default = "default_storage_api_url")]
    pub api_url: String,
}

fn default_storage_api_url() -> String {
    DEFAULT_STORAGE_API_URL.to_string()
}

/// The Unstructured partition service.
#[derive(Debug, Deserialize, Clone)]
pub struct PartitionConfig {
    #[serde(default = "default_partition_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            api_url: default_partition_api_url(),
            api_key: None,
        }
    }
}

fn default_partition_api_url() -> String {
    DEFAULT_PARTITION_API_URL.to_string()
}

/// Which provider cleans text, and how it samples.
#[derive(Debug, Deserialize, Clone)]
pub struct CleanerConfig {
    /// The key of the provider to use from the `providers` map.
    pub provider: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    CLEANER_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    CLEANER_MAX_TOKENS
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackend {
    /// Google Pub/Sub: publish over REST, consume through a push subscription.
    Pubsub,
    /// A bounded channel drained by a worker inside this process.
    InProcess,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueueConfig {
    pub backend: QueueBackend,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_pubsub_api_url")]
    pub api_url: String,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Pipeline runs the in-process worker executes at once.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Shared secret the push subscription appends as `?token=`.
    #[serde(default)]
    pub push_token: Option<String>,
}

fn default_topic() -> String {
    PROCESS_DOCUMENT_TOPIC.to_string()
}

fn default_pubsub_api_url() -> String {
    DEFAULT_PUBSUB_API_URL.to_string()
}

fn default_channel_capacity() -> usize {
    64
}

fn default_max_concurrency() -> usize {
    4
}

/// How Google API calls are authorized.
#[derive(Debug, Deserialize, Clone)]
pub struct GcpConfig {
    /// A fixed bearer token. Takes precedence over the metadata server.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Fetch tokens from the GCE/Cloud Run metadata server.
    #[serde(default = "default_metadata_server")]
    pub metadata_server: bool,
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            metadata_server: default_metadata_server(),
        }
    }
}

fn default_metadata_server() -> bool {
    true
}

/// Treats a blank value (an unset `${VAR}`) as absent.
pub fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(format!("Invalid substitution pattern: {e}")))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// - `${VAR}` placeholders in the file are replaced with environment values.
/// - Top-level keys like `port` are overridden by `PORT`.
/// - Nested keys are overridden by `SIGMA_...` variables (e.g. `SIGMA_QUEUE__BACKEND`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");

    let main_config_path = match config_path_override {
        Some(override_path) => override_path.to_string(),
        None => format!("{base_path}/config.yml"),
    };
    info!("Loading configuration from '{main_config_path}'.");

    let main_content = read_and_substitute(&main_config_path)?.ok_or_else(|| {
        ConfigError::NotFound(format!(
            "Main config file not found at '{main_config_path}'."
        ))
    })?;

    let settings = ConfigBuilder::builder()
        .add_source(File::from_str(&main_content, FileFormat::Yaml))
        // Top-level keys like PORT.
        .add_source(Environment::default())
        // Prefixed variables for nested overrides.
        .add_source(
            Environment::with_prefix("SIGMA")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_count_as_absent() {
        assert_eq!(non_empty(&Some("  ".to_string())), None);
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some("k".to_string())), Some("k".to_string()));
    }
}
