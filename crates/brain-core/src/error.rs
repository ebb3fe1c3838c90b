//! Error types for brain operations.

use thiserror::Error;

/// Errors that can occur while calling a language model.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The brain could not be constructed (missing key, bad URL, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request never reached the model or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The model answered, but not with something usable.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The model did not answer within the allotted time.
    #[error("model call timed out")]
    Timeout,

    /// The brain is temporarily unavailable.
    #[error("brain unavailable: {0}")]
    Unavailable(String),
}
