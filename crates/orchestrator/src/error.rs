//! Error types for building the orchestrator.
//!
//! Running a turn never fails; these only surface at start-up.

use brain_core::BrainError;
use review_index::IndexError;
use thiserror::Error;

/// Errors that can occur while constructing an [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The model client could not be created.
    #[error("brain error: {0}")]
    Brain(#[from] BrainError),

    /// The review index could not be opened.
    #[error("index error: {0}")]
    Index(#[from] IndexError),
}
