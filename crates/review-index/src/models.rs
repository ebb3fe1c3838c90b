//! Index data models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single album review as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ReviewRecord {
    pub id: String,
    pub artist: String,
    pub title: String,
    pub year: i32,
    /// Critic score, 0 to 10.
    pub score: f64,
    pub review: String,
}

/// One hit returned by a recommendation query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub title: String,
    pub artist: String,
    pub review: String,
    pub score: f64,
    /// Cosine similarity between the query and the review, in [-1, 1].
    pub similarity: f32,
}

impl RetrievalResult {
    pub(crate) fn from_record(record: ReviewRecord, similarity: f32) -> Self {
        Self {
            title: record.title,
            artist: record.artist,
            review: record.review,
            score: record.score,
            similarity,
        }
    }
}

/// Metadata for a named collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CollectionInfo {
    pub name: String,
    pub embedding_model: String,
    pub dimension: i64,
    pub created_at: String,
}
