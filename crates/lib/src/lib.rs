//! # SigmaScholar Document Ingestion
//!
//! This crate holds the document ingestion pipeline behind SigmaScholar: it fetches
//! an uploaded study file from object storage, partitions it through an external
//! document service, consolidates and cleans the extracted text with a language
//! model, and records a terminal status on the user's file record.
//!
//! Every external collaborator sits behind a trait in [`providers`], so the
//! [`ingest::PipelineExecutor`] can be assembled from real HTTP clients in
//! production and from in-memory fakes in tests.

pub mod constants;
pub mod errors;
pub mod ingest;
pub mod prompts;
pub mod providers;
pub mod types;

pub use errors::PromptError;
pub use ingest::{ExecutionOutcome, IngestError, PipelineExecutor};
pub use types::{
    ContentElement, FileRecord, IngestionRequest, ProcessingStatus, ProviderConfig, StatusUpdate,
};
