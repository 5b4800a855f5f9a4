use thiserror::Error;

/// Failures raised by the document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    /// A batch precondition did not hold; nothing in the batch was written
    #[error("Precondition failed on {path}: {reason}")]
    PreconditionFailed { path: String, reason: String },

    #[error("Invalid document data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
