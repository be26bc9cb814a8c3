//! # Processing Queue
//!
//! The message boundary between the ingestion trigger and the pipeline executor.
//! Both sides only share the `IngestionRequest` JSON contract; delivery is
//! at-least-once and unordered across files, and redelivery policy belongs to
//! the queue itself.

use crate::{ingest::IngestError, providers::gcp_auth::TokenSource, types::IngestionRequest};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Debug, sync::Arc};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Publishes ingestion requests onto the processing topic.
#[async_trait]
pub trait MessagePublisher: Send + Sync + Debug {
    /// Enqueues `request` and returns the queue's message id.
    async fn publish(&self, request: &IngestionRequest) -> Result<String, IngestError>;
}

// --- Pub/Sub wire structures ---

#[derive(Serialize)]
struct PublishRequest {
    messages: Vec<OutgoingMessage>,
}

#[derive(Serialize)]
struct OutgoingMessage {
    data: String,
    attributes: HashMap<String, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

/// A message as delivered to a push subscription endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    #[serde(default)]
    pub data: String,
    #[serde(default, alias = "message_id")]
    pub message_id: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// The body Pub/Sub POSTs to a push endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: String,
}

impl PushEnvelope {
    /// Decodes the base64 payload back into the request the trigger published.
    pub fn decode(&self) -> Result<IngestionRequest, IngestError> {
        let bytes = general_purpose::STANDARD
            .decode(self.message.data.trim())
            .map_err(|e| IngestError::InvalidArgument(format!("Message data is not base64: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            IngestError::InvalidArgument(format!("Message data is not an ingestion request: {e}"))
        })
    }
}

/// Google Pub/Sub publisher over the REST API.
#[derive(Clone)]
pub struct PubSubPublisher {
    client: ReqwestClient,
    api_url: String,
    project_id: String,
    topic: String,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl Debug for PubSubPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubSubPublisher")
            .field("api_url", &self.api_url)
            .field("project_id", &self.project_id)
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

impl PubSubPublisher {
    pub fn new(
        client: ReqwestClient,
        api_url: String,
        project_id: String,
        topic: String,
        token_source: Option<Arc<dyn TokenSource>>,
    ) -> Self {
        Self {
            client,
            api_url,
            project_id,
            topic,
            token_source,
        }
    }

    pub fn publish_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/topics/{}:publish",
            self.api_url.trim_end_matches('/'),
            self.project_id,
            self.topic
        )
    }
}

/// Wraps the request in the base64 envelope Pub/Sub expects.
pub fn encode_message_data(request: &IngestionRequest) -> Result<String, IngestError> {
    let json = serde_json::to_vec(request)
        .map_err(|e| IngestError::Operation(format!("Could not serialize message: {e}")))?;
    Ok(general_purpose::STANDARD.encode(json))
}

#[async_trait]
impl MessagePublisher for PubSubPublisher {
    async fn publish(&self, request: &IngestionRequest) -> Result<String, IngestError> {
        let body = PublishRequest {
            messages: vec![OutgoingMessage {
                data: encode_message_data(request)?,
                attributes: HashMap::from([("fileId".to_string(), request.file_id.clone())]),
            }],
        };

        let mut http_request = self.client.post(self.publish_url()).json(&body);
        if let Some(source) = &self.token_source {
            let token = source
                .token()
                .await
                .map_err(|e| IngestError::Operation(format!("Could not obtain token: {e}")))?;
            http_request = http_request.bearer_auth(token);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| IngestError::Operation(format!("Publish request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IngestError::Operation(format!(
                "Publish to '{}' failed with status {status}: {text}",
                self.topic
            )));
        }

        let parsed: PublishResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Operation(format!("Malformed publish response: {e}")))?;
        let message_id = parsed.message_ids.into_iter().next().ok_or_else(|| {
            IngestError::Operation("Publish response carried no message id".to_string())
        })?;

        info!(topic = %self.topic, %message_id, file_id = %request.file_id, "Published ingestion request");
        Ok(message_id)
    }
}

/// In-process queue backed by a bounded channel, for local runs and tests.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::Sender<IngestionRequest>,
}

impl ChannelPublisher {
    /// Creates the publisher and the receiving half a worker drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<IngestionRequest>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl MessagePublisher for ChannelPublisher {
    async fn publish(&self, request: &IngestionRequest) -> Result<String, IngestError> {
        self.sender
            .send(request.clone())
            .await
            .map_err(|_| IngestError::Operation("Processing queue is closed".to_string()))?;
        debug!(file_id = %request.file_id, "Queued ingestion request in process");
        Ok(request.file_id.clone())
    }
}
