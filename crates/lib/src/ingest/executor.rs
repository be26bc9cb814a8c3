//! # Pipeline Executor
//!
//! Runs one `IngestionRequest` through fetch → partition → consolidate → clean →
//! record. Every invocation ends in exactly one terminal status write attempt:
//! `completed` when the pipeline succeeds, `failed` when any step before the
//! write throws. A failed `failed` write is logged and swallowed so the queue
//! does not redeliver a message whose outcome is already decided.

use crate::{
    ingest::{
        cleaner::TextCleaner,
        consolidate::consolidate_elements,
        recorder::{RecordOutcome, StatusRecorder},
        IngestError,
    },
    providers::{partition::Partitioner, storage::ObjectStore},
    types::{IngestionRequest, StatusUpdate},
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// How a single invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The record was marked `completed`.
    Completed {
        element_count: usize,
        text_length: usize,
        used_fallback: bool,
    },
    /// The pipeline failed and the record was marked `failed`.
    Failed { error: String },
    /// The pipeline ran but no matching record existed.
    RecordMissing,
    /// Even the terminal write failed; only logged.
    StatusWriteFailed { error: String },
}

/// Successful pipeline output, ready to be recorded.
struct PipelineResult {
    element_count: usize,
    cleaned_text: String,
    used_fallback: bool,
}

/// Consumes ingestion requests. Holds only injected, shareable clients, so one
/// executor can serve any number of concurrent invocations.
#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    object_store: Arc<dyn ObjectStore>,
    partitioner: Arc<dyn Partitioner>,
    cleaner: TextCleaner,
    recorder: StatusRecorder,
}

impl PipelineExecutor {
    pub fn new(
        object_store: Arc<dyn ObjectStore>,
        partitioner: Arc<dyn Partitioner>,
        cleaner: TextCleaner,
        recorder: StatusRecorder,
    ) -> Self {
        Self {
            object_store,
            partitioner,
            cleaner,
            recorder,
        }
    }

    /// Processes one request. Never returns an error: all failures end up in the
    /// record or, failing that, in the log.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, file_id = %request.file_id))]
    pub async fn execute(&self, request: &IngestionRequest) -> ExecutionOutcome {
        info!("Processing '{}' from '{}'", request.file_name, request.storage_path);

        let err = match self.run_pipeline(request).await {
            Ok(result) => match self.record_completion(request, result).await {
                Ok(outcome) => return outcome,
                Err(e) => e,
            },
            Err(e) => e,
        };

        self.record_failure(request, err).await
    }

    async fn record_completion(
        &self,
        request: &IngestionRequest,
        result: PipelineResult,
    ) -> Result<ExecutionOutcome, IngestError> {
        let update = StatusUpdate::completed(result.element_count, result.cleaned_text);
        let outcome = self
            .recorder
            .record(&request.user_id, &request.file_name, &update)
            .await?;

        Ok(match outcome {
            RecordOutcome::Updated(_) => ExecutionOutcome::Completed {
                element_count: result.element_count,
                text_length: update.text_length(),
                used_fallback: result.used_fallback,
            },
            RecordOutcome::RecordMissing => ExecutionOutcome::RecordMissing,
        })
    }

    async fn run_pipeline(&self, request: &IngestionRequest) -> Result<PipelineResult, IngestError> {
        let data = self.object_store.fetch(&request.storage_path).await?;
        let elements = self.partitioner.partition(&request.file_name, data).await?;
        let element_count = elements.len();

        let raw_text = consolidate_elements(&elements);
        if raw_text.is_empty() {
            info!("No text extracted from '{}'; skipping cleanup", request.file_name);
            return Ok(PipelineResult {
                element_count,
                cleaned_text: String::new(),
                used_fallback: false,
            });
        }

        let (cleaned_text, used_fallback) = match self.cleaner.clean(&raw_text).await {
            Ok(cleaned) => (cleaned, false),
            Err(e) => {
                warn!("Cleanup failed, keeping raw text: {e}");
                (raw_text, true)
            }
        };

        Ok(PipelineResult {
            element_count,
            cleaned_text,
            used_fallback,
        })
    }

    /// Best-effort `failed` write for an error raised anywhere before the
    /// terminal write succeeded.
    async fn record_failure(&self, request: &IngestionRequest, err: IngestError) -> ExecutionOutcome {
        let message = err.to_string();
        error!("Processing '{}' failed: {message}", request.file_name);

        let update = StatusUpdate::failed(message.clone());
        match self
            .recorder
            .record(&request.user_id, &request.file_name, &update)
            .await
        {
            Ok(RecordOutcome::Updated(_)) => ExecutionOutcome::Failed { error: message },
            Ok(RecordOutcome::RecordMissing) => ExecutionOutcome::RecordMissing,
            Err(write_err) => {
                error!("Could not record failure for '{}': {write_err}", request.file_name);
                ExecutionOutcome::StatusWriteFailed {
                    error: write_err.to_string(),
                }
            }
        }
    }
}
