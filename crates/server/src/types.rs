use serde::{Deserialize, Serialize};

/// The identifiers a caller supplies to start processing an uploaded file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDocumentPayload {
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub storage_path: String,
    #[serde(default)]
    pub file_name: String,
}

/// The trigger body, either bare or wrapped in the Firebase callable envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TriggerBody {
    Callable { data: ProcessDocumentPayload },
    Direct(ProcessDocumentPayload),
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessDocumentResponse {
    pub success: bool,
    pub message: String,
}

/// The Firebase callable response envelope.
#[derive(Serialize, Deserialize)]
pub struct CallableResult<T> {
    pub result: T,
}
