//! # Ingestion Pipeline
//!
//! The steps that turn an uploaded study file into cleaned text on its file
//! record, and the executor that strings them together.

pub mod cleaner;

pub mod consolidate;

pub mod executor;

pub mod recorder;

pub mod traits;

pub use cleaner::{CleanerSettings, TextCleaner};
pub use consolidate::consolidate_elements;
pub use executor::{ExecutionOutcome, PipelineExecutor};
pub use recorder::{RecordOutcome, StatusRecorder};
pub use traits::IngestError;
