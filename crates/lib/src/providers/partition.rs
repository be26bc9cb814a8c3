//! # Document Partitioning
//!
//! Sends raw file bytes to the Unstructured partition API and returns the typed
//! content elements it produces. OCR, layout detection and chunking all happen
//! on the service side.

use crate::{
    constants::SPLIT_PDF_CONCURRENCY_LEVEL, ingest::IngestError, types::ContentElement,
};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client as ReqwestClient,
};
use std::fmt::Debug;
use tracing::{info, instrument};

/// A service that splits a document into content elements.
#[async_trait]
pub trait Partitioner: Send + Sync + Debug {
    /// Partitions `data`. An empty element list is an `IngestError::Upstream`.
    async fn partition(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<Vec<ContentElement>, IngestError>;
}

/// The fixed parameter set sent with every partition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSettings {
    pub strategy: String,
    pub chunking_strategy: String,
    pub split_pdf_page: bool,
    pub split_pdf_concurrency_level: u32,
    pub languages: Vec<String>,
}

impl Default for PartitionSettings {
    fn default() -> Self {
        Self {
            strategy: "hi_res".to_string(),
            chunking_strategy: "by_title".to_string(),
            split_pdf_page: true,
            split_pdf_concurrency_level: SPLIT_PDF_CONCURRENCY_LEVEL,
            languages: vec!["eng".to_string()],
        }
    }
}

impl PartitionSettings {
    /// The settings as multipart text fields, in the order they are sent.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("strategy", self.strategy.clone()),
            ("chunking_strategy", self.chunking_strategy.clone()),
            ("split_pdf_page", self.split_pdf_page.to_string()),
            (
                "split_pdf_concurrency_level",
                self.split_pdf_concurrency_level.to_string(),
            ),
        ];
        fields.extend(self.languages.iter().map(|l| ("languages", l.clone())));
        fields
    }
}

/// Client for the Unstructured partition endpoint.
#[derive(Clone)]
pub struct UnstructuredClient {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    settings: PartitionSettings,
}

impl Debug for UnstructuredClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnstructuredClient")
            .field("api_url", &self.api_url)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl UnstructuredClient {
    pub fn new(
        client: ReqwestClient,
        api_url: String,
        api_key: Option<String>,
        settings: PartitionSettings,
    ) -> Self {
        Self {
            client,
            api_url,
            api_key,
            settings,
        }
    }
}

#[async_trait]
impl Partitioner for UnstructuredClient {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn partition(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<Vec<ContentElement>, IngestError> {
        let mut form = Form::new().part("files", Part::bytes(data).file_name(file_name.to_string()));
        for (name, value) in self.settings.form_fields() {
            form = form.text(name, value);
        }

        let mut request = self
            .client
            .post(&self.api_url)
            .header("accept", "application/json")
            .multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("unstructured-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IngestError::Upstream(format!("Partition request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Upstream(format!(
                "Partition service returned status {status}: {body}"
            )));
        }

        let elements: Vec<ContentElement> = response.json().await.map_err(|e| {
            IngestError::Upstream(format!("Malformed partition response: {e}"))
        })?;

        if elements.is_empty() {
            return Err(IngestError::Upstream(
                "Partition service returned no elements".to_string(),
            ));
        }

        info!("Partitioned '{}' into {} elements", file_name, elements.len());
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_the_fixed_configuration() {
        let fields = PartitionSettings::default().form_fields();
        assert_eq!(
            fields,
            vec![
                ("strategy", "hi_res".to_string()),
                ("chunking_strategy", "by_title".to_string()),
                ("split_pdf_page", "true".to_string()),
                ("split_pdf_concurrency_level", "15".to_string()),
                ("languages", "eng".to_string()),
            ]
        );
    }
}
