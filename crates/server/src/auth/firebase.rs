//! # Firebase ID Tokens
//!
//! Callers sign in with Firebase Auth and present the RS256 ID token it mints.
//! Tokens are checked against Google's published `securetoken` keys, the
//! project as audience and `https://securetoken.google.com/<project>` as issuer.

use crate::errors::AppError;
use jsonwebtoken::{
    decode, decode_header,
    jwk::{Jwk, JwkSet},
    Algorithm, DecodingKey, Validation,
};
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use sigmascholar::IngestError;
use std::fmt::Debug;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Where Google publishes the keys that sign Firebase ID tokens.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// How long a fetched key set is trusted.
const KEYS_TTL: Duration = Duration::from_secs(60 * 60);

/// Minimum spacing between refetches triggered by an unknown `kid`.
const UNKNOWN_KID_REFETCH: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Verifies Firebase ID tokens for one project.
pub struct FirebaseTokenVerifier {
    client: ReqwestClient,
    jwks_url: String,
    project_id: String,
    keys: RwLock<Option<CachedKeys>>,
}

impl Debug for FirebaseTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseTokenVerifier")
            .field("jwks_url", &self.jwks_url)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl FirebaseTokenVerifier {
    pub fn new(client: ReqwestClient, jwks_url: String, project_id: String) -> Self {
        Self {
            client,
            jwks_url,
            project_id,
            keys: RwLock::new(None),
        }
    }

    pub fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    /// Validates `token` and returns the Firebase uid (`sub`).
    pub async fn verify(&self, token: &str) -> Result<String, AppError> {
        let header = decode_header(token).map_err(|e| {
            warn!("Unreadable token header: {}", e);
            AppError::unauthenticated("Invalid or expired token.")
        })?;
        if header.alg != Algorithm::RS256 {
            warn!(alg = ?header.alg, "Rejected token with an unexpected algorithm");
            return Err(AppError::unauthenticated("Invalid or expired token."));
        }
        let kid = header
            .kid
            .ok_or_else(|| AppError::unauthenticated("Token has no key id."))?;

        let jwk = self.key_for(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| {
            warn!(%kid, "Published key could not be used: {}", e);
            AppError::unauthenticated("Invalid or expired token.")
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

        let token_data = decode::<FirebaseClaims>(token, &key, &validation).map_err(|e| {
            warn!("Firebase ID token validation failed: {}", e);
            AppError::unauthenticated("Invalid or expired token.")
        })?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(AppError::unauthenticated("Token has no subject."));
        }
        Ok(token_data.claims.sub)
    }

    async fn key_for(&self, kid: &str) -> Result<Jwk, AppError> {
        {
            let cached = self.keys.read().await;
            if let Some(cached) = cached.as_ref() {
                if cached.fetched_at.elapsed() < KEYS_TTL {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return Ok(jwk.clone());
                    }
                    if cached.fetched_at.elapsed() < UNKNOWN_KID_REFETCH {
                        return Err(AppError::unauthenticated("Token signed with an unknown key."));
                    }
                }
            }
        }

        let mut cached = self.keys.write().await;
        let keys = self.fetch_keys().await?;
        let jwk = keys.find(kid).cloned();
        *cached = Some(CachedKeys {
            keys,
            fetched_at: Instant::now(),
        });
        jwk.ok_or_else(|| AppError::unauthenticated("Token signed with an unknown key."))
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AppError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| IngestError::Upstream(format!("Signing key request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(IngestError::Upstream(format!(
                "Signing key endpoint returned status {}",
                response.status()
            ))
            .into());
        }
        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| IngestError::Upstream(format!("Malformed signing key set: {e}")))?;
        debug!(count = keys.keys.len(), "Fetched Firebase signing keys");
        Ok(keys)
    }
}
