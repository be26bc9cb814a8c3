//! # Object Storage
//!
//! Read-only access to uploaded files, keyed by their storage path
//! (e.g. `users/u1/notes.pdf`).

use crate::{ingest::IngestError, providers::gcp_auth::TokenSource};
use async_trait::async_trait;
use google_cloud_storage::client::{Client as GcsClient, ClientConfig};
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::Error as StorageError;
use std::{fmt::Debug, sync::Arc};
use tracing::{debug, instrument};

/// A store that can return the raw bytes of an uploaded object.
#[async_trait]
pub trait ObjectStore: Send + Sync + Debug {
    /// Fetches the object at `path`. Missing objects are `IngestError::NotFound`.
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, IngestError>;
}

/// Hands our `TokenSource` to the storage client, which expects the full
/// `Authorization` header value.
#[derive(Debug, Clone)]
struct BearerTokenProvider(Arc<dyn TokenSource>);

#[async_trait]
impl google_cloud_token::TokenSource for BearerTokenProvider {
    async fn token(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let token = self.0.token().await?;
        Ok(format!("Bearer {token}"))
    }
}

impl google_cloud_token::TokenSourceProvider for BearerTokenProvider {
    fn token_source(&self) -> Arc<dyn google_cloud_token::TokenSource> {
        Arc::new(self.clone())
    }
}

/// Cloud Storage (Firebase Storage) through `google-cloud-storage`.
#[derive(Clone)]
pub struct GcsObjectStore {
    client: GcsClient,
    api_url: String,
    bucket: String,
}

impl Debug for GcsObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcsObjectStore")
            .field("api_url", &self.api_url)
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl GcsObjectStore {
    /// `token_source` is optional so the store can talk to an unauthenticated emulator.
    pub fn new(api_url: String, bucket: String, token_source: Option<Arc<dyn TokenSource>>) -> Self {
        let api_url = api_url.trim_end_matches('/').to_string();
        let config = ClientConfig {
            storage_endpoint: api_url.clone(),
            ..ClientConfig::default().anonymous()
        };
        let config = match token_source {
            Some(source) => ClientConfig {
                token_source_provider: Some(Box::new(BearerTokenProvider(source))),
                ..config
            },
            None => config,
        };

        Self {
            client: GcsClient::new(config),
            api_url,
            bucket,
        }
    }
}

fn map_storage_error(path: &str, err: StorageError) -> IngestError {
    let not_found = match &err {
        StorageError::Response(response) => response.code == 404,
        StorageError::HttpClient(e) => e.status().map(|s| s.as_u16()) == Some(404),
        _ => false,
    };
    if not_found {
        IngestError::NotFound(path.to_string())
    } else {
        IngestError::Upstream(format!("Storage download failed: {err}"))
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    #[instrument(skip(self))]
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, IngestError> {
        let bytes = self
            .client
            .download_object(
                &GetObjectRequest {
                    bucket: self.bucket.clone(),
                    object: path.to_string(),
                    ..Default::default()
                },
                &Range::default(),
            )
            .await
            .map_err(|e| map_storage_error(path, e))?;

        debug!(size = bytes.len(), "Downloaded object");
        Ok(bytes)
    }
}
