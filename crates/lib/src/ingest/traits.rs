use thiserror::Error;

/// The error taxonomy shared by the trigger, the pipeline and its providers.
///
/// Each provider maps its transport-specific failures into these variants so the
/// executor and the server can decide what is fatal, what is recorded, and what
/// is recovered locally.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The caller of the trigger is not authenticated.
    #[error("Authentication required: {0}")]
    Authentication(String),

    /// The caller supplied an unusable payload.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The source object does not exist in storage.
    #[error("The specified source could not be found: {0}")]
    NotFound(String),

    /// The partition or completion service failed or answered with garbage.
    #[error("Upstream service failed: {0}")]
    Upstream(String),

    /// The processing request could not be enqueued.
    #[error("Failed to enqueue processing request: {0}")]
    Operation(String),

    /// A document database operation failed.
    #[error("Document database operation failed: {0}")]
    Database(String),

    #[error("An unexpected internal error occurred: {0}")]
    Internal(#[from] anyhow::Error),
}
