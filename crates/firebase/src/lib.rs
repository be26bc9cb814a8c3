//! # `sigmascholar-firebase`: Firestore File Records
//!
//! This crate backs the `FileRecordRepository` trait from the core `sigmascholar`
//! library with Google Firestore. File records live in the `files` collection
//! with camelCase field names, written by the upload flow and updated here once
//! processing reaches a terminal state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::{FirestoreDb, FirestoreDbOptions, FirestoreQueryDirection};
use serde::{Deserialize, Serialize};
use sigmascholar::{
    constants::FILES_COLLECTION,
    ingest::IngestError,
    providers::repository::FileRecordRepository,
    types::{FileRecord, ProcessingStatus, StatusUpdate},
};
use thiserror::Error;
use tracing::{debug, info, instrument};

// --- Error Definitions ---

#[derive(Error, Debug)]
pub enum FirestoreRepositoryError {
    #[error("Firestore error: {0}")]
    Firestore(#[from] firestore::errors::FirestoreError),
}

impl From<FirestoreRepositoryError> for IngestError {
    fn from(err: FirestoreRepositoryError) -> Self {
        IngestError::Database(err.to_string())
    }
}

// --- Data Structures ---

/// Connection settings for the Firestore database.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct FirestoreSettings {
    pub project_id: String,
    /// Overrides the Firestore endpoint, e.g. to reach a local emulator.
    #[serde(default)]
    pub api_url: Option<String>,
}

/// A `files` document as stored in Firestore.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileDocument {
    #[serde(alias = "_firestore_id", default, skip_serializing)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub processing_status: ProcessingStatus,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub element_count: Option<i64>,
    #[serde(default)]
    pub cleaned_text: Option<String>,
    #[serde(default)]
    pub text_length: Option<i64>,
    #[serde(default)]
    pub processing_error: Option<String>,
}

impl From<FileDocument> for FileRecord {
    fn from(doc: FileDocument) -> Self {
        FileRecord {
            id: doc.id.unwrap_or_default(),
            user_id: doc.user_id,
            file_name: doc.file_name,
            processing_status: doc.processing_status,
            processed_at: doc.processed_at,
            element_count: doc.element_count,
            cleaned_text: doc.cleaned_text,
            text_length: doc.text_length,
            processing_error: doc.processing_error,
        }
    }
}

/// The partial document written for a terminal status, and the field mask that
/// limits the write to exactly those fields.
pub fn status_patch(update: &StatusUpdate, processed_at: DateTime<Utc>) -> (FileDocument, Vec<&'static str>) {
    let mut record = FileRecord::pending("", "", "");
    record.apply(update, processed_at);

    let doc = FileDocument {
        id: None,
        user_id: String::new(),
        file_name: String::new(),
        processing_status: record.processing_status,
        processed_at: record.processed_at,
        element_count: record.element_count,
        cleaned_text: record.cleaned_text,
        text_length: record.text_length,
        processing_error: record.processing_error,
    };

    let fields = match update {
        StatusUpdate::Completed { .. } => vec![
            "processingStatus",
            "processedAt",
            "elementCount",
            "cleanedText",
            "textLength",
        ],
        StatusUpdate::Failed { .. } => vec!["processingStatus", "processedAt", "processingError"],
    };
    (doc, fields)
}

// --- Repository Implementation ---

/// File records stored in the Firestore `files` collection.
#[derive(Clone)]
pub struct FirestoreFileRepository {
    db: FirestoreDb,
}

impl std::fmt::Debug for FirestoreFileRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreFileRepository").finish_non_exhaustive()
    }
}

impl FirestoreFileRepository {
    /// Connects using application default credentials.
    pub async fn connect(settings: &FirestoreSettings) -> Result<Self, FirestoreRepositoryError> {
        let mut options = FirestoreDbOptions::new(settings.project_id.clone());
        if let Some(url) = &settings.api_url {
            info!("Using Firestore endpoint {url}");
            options = options.with_firebase_api_url(url.clone());
        }
        let db = FirestoreDb::with_options(options).await?;
        Ok(Self { db })
    }

    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FileRecordRepository for FirestoreFileRepository {
    #[instrument(skip(self))]
    async fn find_by_owner_and_name(
        &self,
        user_id: &str,
        file_name: &str,
    ) -> Result<Option<FileRecord>, IngestError> {
        // Duplicates are possible; the lowest document id wins so redeliveries
        // always land on the same record.
        let docs: Vec<FileDocument> = self
            .db
            .fluent()
            .select()
            .from(FILES_COLLECTION)
            .filter(|q| {
                q.for_all([
                    q.field("userId").eq(user_id),
                    q.field("fileName").eq(file_name),
                ])
            })
            .order_by([("__name__", FirestoreQueryDirection::Ascending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(FirestoreRepositoryError::from)?;

        debug!(matches = docs.len(), "Queried file records");
        Ok(docs.into_iter().next().map(FileRecord::from))
    }

    #[instrument(skip(self, update))]
    async fn apply_status(
        &self,
        record_id: &str,
        update: &StatusUpdate,
        processed_at: DateTime<Utc>,
    ) -> Result<(), IngestError> {
        let (patch, fields) = status_patch(update, processed_at);

        let _: FileDocument = self
            .db
            .fluent()
            .update()
            .fields(fields)
            .in_col(FILES_COLLECTION)
            .document_id(record_id)
            .object(&patch)
            .execute()
            .await
            .map_err(FirestoreRepositoryError::from)?;

        Ok(())
    }
}
