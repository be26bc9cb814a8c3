//! # Shared Constants
//!
//! This module provides a centralized location for constants that are shared across
//! the crates in the `sigmascholar` workspace. Using these constants helps to avoid
//! "magic strings" and keeps the queue and database contracts consistent.

/// The queue topic the ingestion trigger publishes to and the executor consumes from.
pub const PROCESS_DOCUMENT_TOPIC: &str = "process-document";

/// The document database collection holding one record per uploaded file.
pub const FILES_COLLECTION: &str = "files";

/// Default Unstructured partition endpoint.
pub const DEFAULT_PARTITION_API_URL: &str = "https://api.unstructuredapp.io/general/v0/general";

/// Default Cloud Storage JSON API root.
pub const DEFAULT_STORAGE_API_URL: &str = "https://storage.googleapis.com";

/// Default Pub/Sub REST API root.
pub const DEFAULT_PUBSUB_API_URL: &str = "https://pubsub.googleapis.com";

/// Default Anthropic Messages API endpoint.
pub const DEFAULT_ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// The `anthropic-version` header sent with every Messages API call.
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Metadata server endpoint that hands out access tokens to workloads on GCP.
pub const GCP_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Sampling temperature for the cleanup request.
pub const CLEANER_TEMPERATURE: f32 = 0.1;

/// Output cap for the cleanup request.
pub const CLEANER_MAX_TOKENS: u32 = 4000;

/// Number of concurrent page-split requests the partition service may issue.
pub const SPLIT_PDF_CONCURRENCY_LEVEL: u32 = 15;
