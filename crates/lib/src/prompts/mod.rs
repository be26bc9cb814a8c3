//! # Prompt Template Modules
//!
//! This module organizes the prompt templates used by the `sigmascholar` library.
//! The cleanup prompt and its few-shot examples are fixed: changing them changes
//! what ends up in every processed file record.

pub mod cleanup;

pub use cleanup::{build_cleanup_messages, CLEANUP_FEW_SHOT_EXAMPLES, CLEANUP_SYSTEM_PROMPT};
