//! # File Record Repository
//!
//! The document database contract used by the status recorder.

use crate::{
    ingest::IngestError,
    types::{FileRecord, StatusUpdate},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Access to the file records of the document database.
#[async_trait]
pub trait FileRecordRepository: Send + Sync + Debug {
    /// Returns the record for `(user_id, file_name)`.
    ///
    /// The pair is treated as unique. If the store holds duplicates anyway,
    /// implementations must pick one deterministically (lowest document id)
    /// rather than depend on result-set ordering.
    async fn find_by_owner_and_name(
        &self,
        user_id: &str,
        file_name: &str,
    ) -> Result<Option<FileRecord>, IngestError>;

    /// Writes the terminal status fields onto the record with id `record_id`.
    async fn apply_status(
        &self,
        record_id: &str,
        update: &StatusUpdate,
        processed_at: DateTime<Utc>,
    ) -> Result<(), IngestError>;
}
