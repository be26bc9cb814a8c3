use crate::{
    ingest::IngestError,
    providers::repository::FileRecordRepository,
    types::StatusUpdate,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// What happened to a terminal status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record with this id was updated.
    Updated(String),
    /// No record matched; nothing was written or created.
    RecordMissing,
}

/// Writes the terminal status of a pipeline run onto the matching file record.
#[derive(Debug, Clone)]
pub struct StatusRecorder {
    repository: Arc<dyn FileRecordRepository>,
}

impl StatusRecorder {
    pub fn new(repository: Arc<dyn FileRecordRepository>) -> Self {
        Self { repository }
    }

    pub async fn record(
        &self,
        user_id: &str,
        file_name: &str,
        update: &StatusUpdate,
    ) -> Result<RecordOutcome, IngestError> {
        let Some(record) = self
            .repository
            .find_by_owner_and_name(user_id, file_name)
            .await?
        else {
            // TODO: confirm with the upload flow whether a missing record can be a
            // creation race; until then the result is dropped.
            warn!(
                "No file record for user '{}' and file '{}'; dropping '{}' result",
                user_id,
                file_name,
                update.status()
            );
            return Ok(RecordOutcome::RecordMissing);
        };

        self.repository
            .apply_status(&record.id, update, Utc::now())
            .await?;
        info!(record_id = %record.id, status = %update.status(), "Recorded terminal status");
        Ok(RecordOutcome::Updated(record.id))
    }
}
