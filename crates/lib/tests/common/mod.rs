#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Tracing setup and fixtures shared by the pipeline and provider suites.

use sigmascholar::{FileRecord, ProcessingStatus};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the tracing subscriber once per test binary.
pub fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Asserts that a record was never moved out of `pending`.
pub fn assert_untouched(record: &FileRecord) {
    assert_eq!(record.processing_status, ProcessingStatus::Pending);
    assert!(record.processed_at.is_none());
    assert!(record.cleaned_text.is_none());
    assert!(record.processing_error.is_none());
}
