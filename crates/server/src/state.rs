//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. Every external client is constructed once here
//! and injected, so handlers and the worker never create their own.

use crate::{
    auth::{FirebaseTokenVerifier, TokenVerifier},
    config::{non_empty, AppConfig, AuthMode, QueueBackend},
    worker::spawn_worker,
};
use anyhow::{anyhow, Context};
use reqwest::Client as ReqwestClient;
use sigmascholar::{
    ingest::{CleanerSettings, PipelineExecutor, StatusRecorder, TextCleaner},
    providers::{
        factory::create_provider,
        gcp_auth::{MetadataServerTokenSource, StaticToken, TokenSource},
        partition::{PartitionSettings, UnstructuredClient},
        queue::{ChannelPublisher, MessagePublisher, PubSubPublisher},
        storage::GcsObjectStore,
    },
};
use sigmascholar_firebase::FirestoreFileRepository;
use std::sync::Arc;
use tracing::{info, warn};

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Where the trigger enqueues processing requests.
    pub publisher: Arc<dyn MessagePublisher>,
    /// Runs requests delivered to the push endpoint.
    pub executor: Arc<PipelineExecutor>,
    /// Checks caller tokens on the trigger.
    pub verifier: Arc<TokenVerifier>,
    /// Expected `?token=` on push deliveries, if any.
    pub push_token: Option<Arc<String>>,
}

impl AppState {
    pub fn new(
        publisher: Arc<dyn MessagePublisher>,
        executor: Arc<PipelineExecutor>,
        verifier: TokenVerifier,
    ) -> Self {
        Self {
            publisher,
            executor,
            verifier: Arc::new(verifier),
            push_token: None,
        }
    }

    pub fn with_push_token(mut self, token: impl Into<String>) -> Self {
        self.push_token = Some(Arc::new(token.into()));
        self
    }
}

/// Picks how Google API calls are authorized: a fixed token, the metadata server, or nothing.
pub fn build_token_source(
    config: &AppConfig,
    client: &ReqwestClient,
) -> Option<Arc<dyn TokenSource>> {
    if let Some(token) = non_empty(&config.gcp.access_token) {
        info!("Using a configured GCP access token.");
        Some(Arc::new(StaticToken(token)))
    } else if config.gcp.metadata_server {
        info!("Using the metadata server for GCP access tokens.");
        Some(Arc::new(MetadataServerTokenSource::new(client.clone())))
    } else {
        info!("GCP calls will be sent without credentials.");
        None
    }
}

/// Picks how caller tokens are verified.
pub fn build_verifier(config: &AppConfig, client: &ReqwestClient) -> anyhow::Result<TokenVerifier> {
    match config.auth.mode {
        AuthMode::Firebase => {
            let project_id = non_empty(&config.auth.project_id)
                .unwrap_or_else(|| config.firestore.project_id.clone());
            if project_id.trim().is_empty() {
                return Err(anyhow!(
                    "auth.project_id (or firestore.project_id) must be set to verify Firebase ID tokens"
                ));
            }
            info!(%project_id, "Verifying Firebase ID tokens.");
            Ok(TokenVerifier::Firebase(FirebaseTokenVerifier::new(
                client.clone(),
                config.auth.jwks_url.clone(),
                project_id,
            )))
        }
        AuthMode::SharedSecret => {
            if config.auth.jwt_secret.trim().is_empty() {
                return Err(anyhow!("auth.jwt_secret must be set (JWT_SECRET)"));
            }
            warn!("Verifying caller tokens with a shared secret; use this for local runs only.");
            Ok(TokenVerifier::shared_secret(config.auth.jwt_secret.clone()))
        }
    }
}

/// Builds the pipeline executor from the configuration.
pub async fn build_executor(
    config: &AppConfig,
    client: &ReqwestClient,
    token_source: Option<Arc<dyn TokenSource>>,
) -> anyhow::Result<PipelineExecutor> {
    if config.storage.bucket.trim().is_empty() {
        return Err(anyhow!("storage.bucket must be set (FIREBASE_STORAGE_BUCKET)"));
    }
    let object_store = GcsObjectStore::new(
        config.storage.api_url.clone(),
        config.storage.bucket.clone(),
        token_source,
    );

    let partitioner = UnstructuredClient::new(
        client.clone(),
        config.partition.api_url.clone(),
        non_empty(&config.partition.api_key),
        PartitionSettings::default(),
    );

    let provider_name = &config.cleaner.provider;
    let provider_config = config.providers.get(provider_name).ok_or_else(|| {
        anyhow!("cleaner.provider '{provider_name}' is not defined under 'providers'")
    })?;
    let provider = create_provider(provider_name, provider_config)?;
    let cleaner = TextCleaner::new(
        Arc::from(provider),
        CleanerSettings {
            temperature: config.cleaner.temperature,
            max_tokens: config.cleaner.max_tokens,
        },
    );

    let repository = FirestoreFileRepository::connect(&config.firestore)
        .await
        .context("Failed to connect to Firestore")?;
    info!(project_id = %config.firestore.project_id, "Initialized Firestore file repository.");

    Ok(PipelineExecutor::new(
        Arc::new(object_store),
        Arc::new(partitioner),
        cleaner,
        StatusRecorder::new(Arc::new(repository)),
    ))
}

/// Builds the Pub/Sub publisher for the configured topic.
pub fn build_pubsub_publisher(
    config: &AppConfig,
    client: &ReqwestClient,
    token_source: Option<Arc<dyn TokenSource>>,
) -> anyhow::Result<PubSubPublisher> {
    let project_id = non_empty(&config.queue.project_id)
        .ok_or_else(|| anyhow!("queue.project_id is required for the pubsub backend"))?;
    info!(topic = %config.queue.topic, "Publishing to Pub/Sub.");
    Ok(PubSubPublisher::new(
        client.clone(),
        config.queue.api_url.clone(),
        project_id,
        config.queue.topic.clone(),
        token_source,
    ))
}

/// Builds the shared application state from the configuration.
///
/// With the `in_process` queue backend this also spawns the worker that drains
/// the channel, so it must be called inside a Tokio runtime.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let client = ReqwestClient::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let verifier = build_verifier(&config, &client)?;
    let token_source = build_token_source(&config, &client);
    let executor = Arc::new(build_executor(&config, &client, token_source.clone()).await?);

    let publisher: Arc<dyn MessagePublisher> = match config.queue.backend {
        QueueBackend::Pubsub => Arc::new(build_pubsub_publisher(&config, &client, token_source)?),
        QueueBackend::InProcess => {
            let (publisher, receiver) = ChannelPublisher::channel(config.queue.channel_capacity);
            spawn_worker(receiver, executor.clone(), config.queue.max_concurrency);
            info!(
                capacity = config.queue.channel_capacity,
                max_concurrency = config.queue.max_concurrency,
                "Processing requests in process."
            );
            Arc::new(publisher)
        }
    };

    let mut state = AppState::new(publisher, executor, verifier);
    if let Some(token) = non_empty(&config.queue.push_token) {
        state = state.with_push_token(token);
    }
    Ok(state)
}
