//! In-memory fakes for every provider trait of the `sigmascholar` pipeline.
//!
//! Each fake records how it was called so tests can assert on the number and
//! content of external interactions, not just on the final record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sigmascholar::{
    errors::PromptError,
    ingest::{CleanerSettings, IngestError, PipelineExecutor, StatusRecorder, TextCleaner},
    providers::{
        ai::{AiProvider, CompletionRequest},
        partition::Partitioner,
        queue::MessagePublisher,
        repository::FileRecordRepository,
        storage::ObjectStore,
    },
    types::{ContentElement, FileRecord, IngestionRequest, StatusUpdate},
};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

// --- Mock AI Provider ---

#[derive(Clone, Debug)]
enum MockReply {
    Text(String),
    Fail(String),
}

/// A completion provider that answers every request with the same programmed reply.
#[derive(Clone, Debug)]
pub struct MockAiProvider {
    reply: Arc<Mutex<MockReply>>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockAiProvider {
    /// Answers every request with `text`.
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Arc::new(Mutex::new(MockReply::Text(text.to_string()))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fails every request with an API error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Arc::new(Mutex::new(MockReply::Fail(message.to_string()))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Retrieves the recorded requests for assertion.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, PromptError> {
        self.calls.lock().unwrap().push(request.clone());
        match &*self.reply.lock().unwrap() {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Fail(message) => Err(PromptError::AiApi {
                status: 500,
                body: message.clone(),
            }),
        }
    }
}

// --- Mock Object Store ---

/// An object store backed by a map of storage paths to bytes.
#[derive(Clone, Debug, Default)]
pub struct MockObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fetches: Arc<Mutex<Vec<String>>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, path: &str, data: &[u8]) -> Self {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
        self
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, IngestError> {
        self.fetches.lock().unwrap().push(path.to_string());
        self.objects
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| IngestError::NotFound(path.to_string()))
    }
}

// --- Mock Partitioner ---

/// A partitioner that returns programmed elements, or fails like an upstream outage.
#[derive(Clone, Debug)]
pub struct MockPartitioner {
    result: Arc<Mutex<Result<Vec<ContentElement>, String>>>,
    calls: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MockPartitioner {
    pub fn returning(elements: Vec<ContentElement>) -> Self {
        Self {
            result: Arc::new(Mutex::new(Ok(elements))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Convenience for elements that only carry text.
    pub fn with_texts(texts: &[Option<&str>]) -> Self {
        Self::returning(
            texts
                .iter()
                .map(|text| ContentElement {
                    text: text.map(String::from),
                    ..Default::default()
                })
                .collect(),
        )
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Arc::new(Mutex::new(Err(message.to_string()))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `(file_name, byte_len)` of every call.
    pub fn get_calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Partitioner for MockPartitioner {
    async fn partition(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<Vec<ContentElement>, IngestError> {
        self.calls
            .lock()
            .unwrap()
            .push((file_name.to_string(), data.len()));
        self.result
            .lock()
            .unwrap()
            .clone()
            .map_err(IngestError::Upstream)
    }
}

// --- In-Memory File Record Repository ---

/// A document database holding file records in a vector.
#[derive(Clone, Debug, Default)]
pub struct MemoryFileRepository {
    records: Arc<Mutex<Vec<FileRecord>>>,
    writes: Arc<Mutex<Vec<(String, StatusUpdate)>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, record: FileRecord) -> Self {
        self.insert(record);
        self
    }

    pub fn insert(&self, record: FileRecord) {
        self.records.lock().unwrap().push(record);
    }

    /// Makes every subsequent `apply_status` call fail.
    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }

    pub fn records(&self) -> Vec<FileRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn get(&self, id: &str) -> Option<FileRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Every attempted terminal write, successful or not.
    pub fn writes(&self) -> Vec<(String, StatusUpdate)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileRecordRepository for MemoryFileRepository {
    async fn find_by_owner_and_name(
        &self,
        user_id: &str,
        file_name: &str,
    ) -> Result<Option<FileRecord>, IngestError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id && r.file_name == file_name)
            .min_by(|a, b| a.id.cmp(&b.id))
            .cloned())
    }

    async fn apply_status(
        &self,
        record_id: &str,
        update: &StatusUpdate,
        processed_at: DateTime<Utc>,
    ) -> Result<(), IngestError> {
        self.writes
            .lock()
            .unwrap()
            .push((record_id.to_string(), update.clone()));
        if *self.fail_writes.lock().unwrap() {
            return Err(IngestError::Database("write rejected".to_string()));
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| IngestError::Database(format!("no record '{record_id}'")))?;
        record.apply(update, processed_at);
        Ok(())
    }
}

// --- Recording Publisher ---

/// A publisher that keeps every message in memory, or refuses them all.
#[derive(Clone, Debug, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<IngestionRequest>>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn published(&self) -> Vec<IngestionRequest> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, request: &IngestionRequest) -> Result<String, IngestError> {
        if self.fail {
            return Err(IngestError::Operation("topic unavailable".to_string()));
        }
        let mut published = self.published.lock().unwrap();
        published.push(request.clone());
        Ok(format!("msg-{}", published.len()))
    }
}

// --- Executor Assembly ---

/// The fakes behind one executor, kept around for assertions.
pub struct PipelineFakes {
    pub store: MockObjectStore,
    pub partitioner: MockPartitioner,
    pub ai: MockAiProvider,
    pub repository: MemoryFileRepository,
}

impl PipelineFakes {
    pub fn executor(&self) -> PipelineExecutor {
        PipelineExecutor::new(
            Arc::new(self.store.clone()),
            Arc::new(self.partitioner.clone()),
            TextCleaner::new(Arc::new(self.ai.clone()), CleanerSettings::default()),
            StatusRecorder::new(Arc::new(self.repository.clone())),
        )
    }
}

/// Builds an `IngestionRequest` for a user's file stored under `{user}/{file}`.
pub fn request_for(user_id: &str, file_name: &str) -> IngestionRequest {
    IngestionRequest {
        user_id: user_id.to_string(),
        file_id: format!("{user_id}-{file_name}"),
        storage_path: format!("{user_id}/{file_name}"),
        file_name: file_name.to_string(),
    }
}
