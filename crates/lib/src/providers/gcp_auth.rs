//! # GCP Access Tokens
//!
//! Cloud Storage and Pub/Sub calls need an OAuth bearer token. On GCP the
//! workload's service account hands one out through the metadata server; for
//! local runs against emulators a fixed token (or none) is configured instead.

use crate::{constants::GCP_METADATA_TOKEN_URL, ingest::IngestError};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use std::fmt::Debug;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Tokens are refreshed this long before the server-reported expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

fn is_fresh(token: &CachedToken) -> bool {
    Instant::now()
        .checked_add(REFRESH_MARGIN)
        .is_some_and(|deadline| token.expires_at > deadline)
}

/// A source of bearer tokens for Google APIs.
#[async_trait]
pub trait TokenSource: Send + Sync + Debug {
    async fn token(&self) -> Result<String, IngestError>;
}

/// A fixed token, typically supplied through configuration.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String, IngestError> {
        Ok(self.0.clone())
    }
}

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Fetches and caches tokens from the GCE/Cloud Run metadata server.
pub struct MetadataServerTokenSource {
    client: ReqwestClient,
    token_url: String,
    cached: RwLock<Option<CachedToken>>,
}

impl Debug for MetadataServerTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataServerTokenSource")
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl MetadataServerTokenSource {
    pub fn new(client: ReqwestClient) -> Self {
        Self::with_url(client, GCP_METADATA_TOKEN_URL.to_string())
    }

    pub fn with_url(client: ReqwestClient, token_url: String) -> Self {
        Self {
            client,
            token_url,
            cached: RwLock::new(None),
        }
    }

    async fn fetch(&self) -> Result<MetadataTokenResponse, IngestError> {
        let response = self
            .client
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| IngestError::Upstream(format!("Metadata token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(IngestError::Upstream(format!(
                "Metadata server returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| IngestError::Upstream(format!("Malformed metadata token response: {e}")))
    }
}

#[async_trait]
impl TokenSource for MetadataServerTokenSource {
    async fn token(&self) -> Result<String, IngestError> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if is_fresh(token) {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;
        // Another task may have refreshed while we waited for the write lock.
        if let Some(token) = cached.as_ref() {
            if is_fresh(token) {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.fetch().await?;
        debug!(expires_in = fresh.expires_in, "Refreshed GCP access token");
        // An unrepresentable expiry is stored as already expired.
        let now = Instant::now();
        *cached = Some(CachedToken {
            access_token: fresh.access_token.clone(),
            expires_at: now
                .checked_add(Duration::from_secs(fresh.expires_in))
                .unwrap_or(now),
        });
        Ok(fresh.access_token)
    }
}
