//! # Domain Types
//!
//! The data that flows through the ingestion pipeline: the queue message, the
//! elements returned by the partition service, and the file record the pipeline
//! finally writes to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The message carried from the ingestion trigger to the pipeline executor.
///
/// Serialized as camelCase JSON, which is the queue contract both sides agree on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionRequest {
    pub user_id: String,
    pub file_id: String,
    pub storage_path: String,
    pub file_name: String,
}

/// A single typed element returned by the partition service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentElement {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

impl ContentElement {
    /// Builds an element that only carries text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Lifecycle of a file record. Only the pipeline moves a record out of `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's uploaded file as stored in the document database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// The database document id. Not part of the stored fields.
    #[serde(skip)]
    pub id: String,
    pub user_id: String,
    pub file_name: String,
    #[serde(default)]
    pub processing_status: ProcessingStatus,
    #[serde(default)]
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

impl FileRecord {
    /// A freshly uploaded record awaiting processing.
    pub fn pending(id: &str, user_id: &str, file_name: &str) -> Self {
        Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
            file_name: file_name.to_string(),
            processing_status: ProcessingStatus::Pending,
            processed_at: None,
            element_count: None,
            cleaned_text: None,
            text_length: None,
            processing_error: None,
        }
    }

    /// Applies a terminal update the same way the database adapters do.
    pub fn apply(&mut self, update: &StatusUpdate, processed_at: DateTime<Utc>) {
        self.processing_status = update.status();
        self.processed_at = Some(processed_at);
        match update {
            StatusUpdate::Completed {
                element_count,
                cleaned_text,
            } => {
                self.element_count = Some(*element_count as i64);
                self.text_length = Some(update.text_length() as i64);
                self.cleaned_text = Some(cleaned_text.clone());
            }
            StatusUpdate::Failed { error } => {
                self.processing_error = Some(error.clone());
            }
        }
    }
}

/// The single terminal write the pipeline performs on a file record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Completed {
        element_count: usize,
        cleaned_text: String,
    },
    Failed {
        error: String,
    },
}

impl StatusUpdate {
    pub fn completed(element_count: usize, cleaned_text: impl Into<String>) -> Self {
        StatusUpdate::Completed {
            element_count,
            cleaned_text: cleaned_text.into(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        StatusUpdate::Failed {
            error: error.into(),
        }
    }

    pub fn status(&self) -> ProcessingStatus {
        match self {
            StatusUpdate::Completed { .. } => ProcessingStatus::Completed,
            StatusUpdate::Failed { .. } => ProcessingStatus::Failed,
        }
    }

    /// Length of the cleaned text in Unicode scalar values; zero for failures.
    ///
    /// This is not a UTF-16 length: a character outside the Basic Multilingual
    /// Plane such as `𝑥` counts once here but twice in a JavaScript `length`.
    pub fn text_length(&self) -> usize {
        match self {
            StatusUpdate::Completed { cleaned_text, .. } => cleaned_text.chars().count(),
            StatusUpdate::Failed { .. } => 0,
        }
    }
}

/// A reusable configuration for a specific AI provider instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The type of provider ("anthropic" or "local").
    pub provider: String,
    /// The API URL. Optional for providers with a well-known endpoint.
    #[serde(default)]
    pub api_url: Option<String>,
    /// The API key, which can be null for local providers.
    #[serde(default)]
    pub api_key: Option<String>,
    pub model_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ingestion_request_uses_camel_case_on_the_wire() {
        let request = IngestionRequest {
            user_id: "u1".into(),
            file_id: "f1".into(),
            storage_path: "u1/f.pdf".into(),
            file_name: "f.pdf".into(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"userId": "u1", "fileId": "f1", "storagePath": "u1/f.pdf", "fileName": "f.pdf"})
        );
    }

    #[test]
    fn content_element_tolerates_null_text_and_missing_metadata() {
        let elements: Vec<ContentElement> = serde_json::from_value(json!([
            {"type": "Title", "text": null},
            {"text": "body", "metadata": {"page_number": 2}}
        ]))
        .unwrap();
        assert_eq!(elements[0].text, None);
        assert_eq!(elements[0].element_type.as_deref(), Some("Title"));
        assert_eq!(elements[1].metadata["page_number"], 2);
    }

    #[test]
    fn text_length_counts_characters() {
        assert_eq!(StatusUpdate::completed(2, "Hello World!").text_length(), 12);
        assert_eq!(StatusUpdate::completed(1, "Δx → 0").text_length(), 6);
        assert_eq!(StatusUpdate::failed("boom").text_length(), 0);
    }

    #[test]
    fn text_length_counts_astral_characters_once() {
        let text = "𝑥 = 1";
        assert_eq!(text.encode_utf16().count(), 6);
        assert_eq!(StatusUpdate::completed(1, text).text_length(), 5);
    }

    #[test]
    fn failed_update_keeps_previous_text_fields() {
        let mut record = FileRecord::pending("doc", "u1", "f.pdf");
        record.apply(&StatusUpdate::failed("partition failed"), Utc::now());
        assert_eq!(record.processing_status, ProcessingStatus::Failed);
        assert_eq!(record.processing_error.as_deref(), Some("partition failed"));
        assert!(record.cleaned_text.is_none());
        assert!(record.processed_at.is_some());
    }
}
