//! Index error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur while building or querying the review index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The embedder could not produce a vector.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Reading a documents file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A documents file was not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record failed validation.
    #[error("invalid record {id}: {source}")]
    InvalidRecord {
        id: String,
        #[source]
        source: ValidationError,
    },

    /// Query vector and stored vectors disagree on size.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The collection was built with a different embedding model.
    #[error("collection {collection} uses model {stored}, embedder is {current}")]
    ModelMismatch {
        collection: String,
        stored: String,
        current: String,
    },

    /// Collection not found
    #[error("collection not found: {0}")]
    CollectionNotFound(String),
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
