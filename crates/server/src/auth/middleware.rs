//! # Authentication Middleware
//!
//! This module provides the JWT-based `AuthenticatedUser` extractor. Handlers
//! that take it only run for callers presenting a valid, unexpired token; every
//! other request is rejected with `401 Unauthorized`.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{auth::firebase::FirebaseTokenVerifier, errors::AppError, state::AppState};

/// Represents the claims we expect to find in the JWT.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The subject of the token, which we use as the unique user identifier.
    pub sub: String,
    /// The expiration timestamp.
    pub exp: usize,
}

/// The verified identity of the caller. Carries the user id from `sub`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

/// Validates `token` against `secret` and returns the caller's user id.
pub fn verify_token(token: &str, secret: &str) -> Result<String, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        warn!("JWT validation failed: {}", e);
        AppError::unauthenticated("Invalid or expired token.")
    })?;

    if token_data.claims.sub.trim().is_empty() {
        return Err(AppError::unauthenticated("Token has no subject."));
    }
    Ok(token_data.claims.sub)
}

/// How caller tokens are checked.
#[derive(Debug)]
pub enum TokenVerifier {
    /// Firebase ID tokens, as presented by the extension.
    Firebase(FirebaseTokenVerifier),
    /// HS256 tokens signed with a shared secret, for local runs and tests.
    SharedSecret(String),
}

impl TokenVerifier {
    pub fn shared_secret(secret: impl Into<String>) -> Self {
        TokenVerifier::SharedSecret(secret.into())
    }

    /// Returns the caller's user id.
    pub async fn verify(&self, token: &str) -> Result<String, AppError> {
        match self {
            TokenVerifier::Firebase(verifier) => verifier.verify(token).await,
            TokenVerifier::SharedSecret(secret) => verify_token(token, secret),
        }
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer_header =
            Option::<TypedHeader<Authorization<Bearer>>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    warn!("Unexpected error during header extraction: {}", e);
                    AppError::unauthenticated("Invalid Authorization header format.")
                })?;

        let Some(TypedHeader(Authorization(bearer))) = bearer_header else {
            debug!("No Authorization header found, rejecting call.");
            return Err(AppError::unauthenticated(
                "The function must be called while authenticated.",
            ));
        };

        let user_id = state.verifier.verify(bearer.token()).await?;
        Ok(AuthenticatedUser(user_id))
    }
}
