//! # Pub/Sub Push Consumer Tests
//!
//! Delivers push messages to `POST /pubsub/process-document` and checks the
//! resulting file record, first with in-memory fakes and then with the real
//! HTTP clients pointed at an `httpmock` server.

mod common;

use anyhow::Result;
use common::{fake_state, hello_world_fakes, push_body, TestApp};
use httpmock::prelude::*;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde_json::json;
use sigmascholar::{
    ingest::{CleanerSettings, PipelineExecutor, StatusRecorder, TextCleaner},
    providers::{
        ai::anthropic::AnthropicProvider,
        partition::{PartitionSettings, UnstructuredClient},
        storage::GcsObjectStore,
    },
    FileRecord, IngestionRequest, ProcessingStatus,
};
use sigmascholar_server::state::AppState;
use sigmascholar_test_utils::{request_for, MemoryFileRepository, RecordingPublisher};
use std::sync::Arc;

#[tokio::test]
async fn test_push_delivery_runs_pipeline_and_acks() -> Result<()> {
    let fakes = hello_world_fakes();
    let app = TestApp::spawn_with_state(fake_state(&fakes, &RecordingPublisher::new())).await?;

    let response = app.post_push("", &push_body(&request_for("u1", "f.pdf"))).await;

    assert!(response.status().is_success());
    let record = fakes.repository.get("rec-1").unwrap();
    assert_eq!(record.processing_status, ProcessingStatus::Completed);
    assert_eq!(record.cleaned_text.as_deref(), Some("Hello World!"));
    assert_eq!(record.text_length, Some(12));
    assert_eq!(record.element_count, Some(2));
    Ok(())
}

#[tokio::test]
async fn test_pipeline_failure_is_recorded_not_returned() -> Result<()> {
    let fakes = hello_world_fakes();
    let app = TestApp::spawn_with_state(fake_state(&fakes, &RecordingPublisher::new())).await?;
    let request = IngestionRequest {
        storage_path: "u1/missing.pdf".to_string(),
        ..request_for("u1", "f.pdf")
    };

    let response = app.post_push("", &push_body(&request)).await;

    // Acked so the queue does not redeliver a decided outcome.
    assert!(response.status().is_success());
    let record = fakes.repository.get("rec-1").unwrap();
    assert_eq!(record.processing_status, ProcessingStatus::Failed);
    assert!(record.processing_error.is_some());
    Ok(())
}

#[tokio::test]
async fn test_malformed_message_is_acked_without_processing() -> Result<()> {
    let fakes = hello_world_fakes();
    let app = TestApp::spawn_with_state(fake_state(&fakes, &RecordingPublisher::new())).await?;

    let garbage = json!({"message": {"data": "%%% not base64 %%%", "messageId": "m-2"}});
    let response = app.post_push("", &garbage).await;
    assert!(response.status().is_success());

    let wrong_shape = json!({"hello": "world"});
    let response = app.post_push("", &wrong_shape).await;
    assert!(response.status().is_success());

    assert!(fakes.store.fetches().is_empty());
    assert!(fakes.repository.writes().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_push_token_is_enforced_when_configured() -> Result<()> {
    let fakes = hello_world_fakes();
    let state = fake_state(&fakes, &RecordingPublisher::new()).with_push_token("push-secret");
    let app = TestApp::spawn_with_state(state).await?;
    let body = push_body(&request_for("u1", "f.pdf"));

    let response = app.post_push("?token=wrong", &body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(fakes.repository.writes().is_empty());

    let response = app.post_push("?token=push-secret", &body).await;
    assert!(response.status().is_success());
    assert_eq!(fakes.repository.writes().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_push_delivery_end_to_end_over_http() -> Result<()> {
    // --- 1. Arrange: storage, partition and completion services ---
    let server = MockServer::start_async().await;

    let storage_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_contains("/storage/v1/b/sigma-bucket/o/")
                .query_param("alt", "media");
            then.status(200).body("%PDF-1.7 fake");
        })
        .await;

    let partition_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/general/v0/general")
                .header("unstructured-api-key", "partition-key");
            then.status(200).json_body(json!([
                {"type": "Title", "element_id": "e1", "text": "Hello", "metadata": {}},
                {"type": "NarrativeText", "element_id": "e2", "text": "World", "metadata": {}}
            ]));
        })
        .await;

    let completion_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .header("x-api-key", "anthropic-key")
                .body_contains("\"role\":\"user\",\"content\":\"Hello World\"");
            then.status(200)
                .json_body(json!({"content": [{"type": "text", "text": "Hello World!"}]}));
        })
        .await;

    let client = ReqwestClient::new();
    let repository =
        MemoryFileRepository::new().with_record(FileRecord::pending("rec-1", "u1", "f.pdf"));
    let executor = PipelineExecutor::new(
        Arc::new(GcsObjectStore::new(
            server.base_url(),
            "sigma-bucket".to_string(),
            None,
        )),
        Arc::new(UnstructuredClient::new(
            client.clone(),
            server.url("/general/v0/general"),
            Some("partition-key".to_string()),
            PartitionSettings::default(),
        )),
        TextCleaner::new(
            Arc::new(AnthropicProvider::new(
                server.url("/v1/messages"),
                "anthropic-key".to_string(),
                "claude-test".to_string(),
            )?),
            CleanerSettings::default(),
        ),
        StatusRecorder::new(Arc::new(repository.clone())),
    );
    let state = AppState::new(
        Arc::new(RecordingPublisher::new()),
        Arc::new(executor),
        common::test_verifier(),
    );
    let app = TestApp::spawn_with_state(state).await?;

    // --- 2. Act ---
    let response = app.post_push("", &push_body(&request_for("u1", "f.pdf"))).await;

    // --- 3. Assert ---
    assert!(response.status().is_success());
    storage_mock.assert_async().await;
    partition_mock.assert_async().await;
    completion_mock.assert_async().await;

    let record = repository.get("rec-1").unwrap();
    assert_eq!(record.processing_status, ProcessingStatus::Completed);
    assert_eq!(record.element_count, Some(2));
    assert_eq!(record.cleaned_text.as_deref(), Some("Hello World!"));
    assert_eq!(record.text_length, Some(12));
    Ok(())
}
