//! # Common Test Utilities
//!
//! This module centralizes the test harness used across the
//! `sigmascholar-server` integration tests:
//!
//! - `TestApp`: spawns the real router on a random port with an injected
//!   `AppState`, usually assembled from the in-memory fakes.
//! - JWT helpers to mint caller tokens.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use base64::{engine::general_purpose, Engine as _};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use serde_json::{json, Value};
use sigmascholar::{FileRecord, IngestionRequest};
use sigmascholar_server::{
    auth::{Claims, TokenVerifier},
    router,
    state::AppState,
};
use sigmascholar_test_utils::{
    MemoryFileRepository, MockAiProvider, MockObjectStore, MockPartitioner, PipelineFakes,
    RecordingPublisher,
};
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::{net::TcpListener, task::JoinHandle};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

// --- Full Application Test Harness ---

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub app_state: AppState,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    pub async fn spawn_with_state(app_state: AppState) -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        Ok(Self {
            address,
            client: Client::new(),
            app_state: app_state_for_harness,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub async fn post_trigger(&self, token: Option<&str>, body: &Value) -> reqwest::Response {
        let mut request = self
            .client
            .post(format!("{}/process-document", self.address))
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to send trigger request")
    }

    pub async fn post_push(&self, query: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}/pubsub/process-document{query}", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to send push request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

// --- Fakes ---

/// The standard scenario: `u1` uploaded `f.pdf`, which partitions into
/// "Hello" and "World" and cleans to "Hello World!".
pub fn hello_world_fakes() -> PipelineFakes {
    PipelineFakes {
        store: MockObjectStore::new().with_object("u1/f.pdf", b"%PDF-1.7"),
        partitioner: MockPartitioner::with_texts(&[Some("Hello"), Some("World")]),
        ai: MockAiProvider::replying("Hello World!"),
        repository: MemoryFileRepository::new()
            .with_record(FileRecord::pending("rec-1", "u1", "f.pdf")),
    }
}

/// App state backed by `fakes` for the pipeline and `publisher` for the trigger.
pub fn fake_state(fakes: &PipelineFakes, publisher: &RecordingPublisher) -> AppState {
    AppState::new(
        Arc::new(publisher.clone()),
        Arc::new(fakes.executor()),
        test_verifier(),
    )
}

/// Shared-secret verification with `TEST_JWT_SECRET`.
pub fn test_verifier() -> TokenVerifier {
    TokenVerifier::shared_secret(TEST_JWT_SECRET)
}

// --- Payload Helpers ---

pub fn trigger_body() -> Value {
    json!({"fileId": "f1", "storagePath": "u1/f.pdf", "fileName": "f.pdf"})
}

/// Wraps a request in the body Pub/Sub POSTs to push endpoints.
pub fn push_body(request: &IngestionRequest) -> Value {
    let data = general_purpose::STANDARD.encode(serde_json::to_vec(request).unwrap());
    json!({
        "message": {"data": data, "messageId": "m-1", "attributes": {"fileId": request.file_id}},
        "subscription": "projects/sigma/subscriptions/process-document-push"
    })
}

/// Polls `check` until it holds or a few seconds have passed.
pub async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

// --- JWT Helpers ---

/// Generates a valid JWT for a given user identifier (subject).
pub fn generate_jwt(sub: &str) -> Result<String> {
    generate_jwt_with_expiry(sub, 3600)
}

/// Generates a JWT whose expiry is `offset_secs` from now (negative for expired).
pub fn generate_jwt_with_expiry(sub: &str, offset_secs: i64) -> Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
    let claims = Claims {
        sub: sub.to_string(),
        exp: (now + offset_secs) as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )?;
    Ok(token)
}
