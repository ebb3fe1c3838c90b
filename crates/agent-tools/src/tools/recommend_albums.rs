//! Album recommendations from the review index.

use async_trait::async_trait;
use review_index::ReviewIndex;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};
use crate::tools::DisabledTool;

/// Text returned when the index has nothing to offer.
pub const NO_MATCHES: &str = "No matching album reviews found.";

const NAME: &str = "recommend_albums";

const DESCRIPTION: &str = "Recommends albums by searching a collection of album reviews for \
     the given description (genre, mood, sound, artist). Returns title, artist, review and \
     score (0-10) for each match, best match first.";

fn parameters() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "What the user is looking for, e.g. 'ambient textures'"
            },
            "n_results": {
                "type": "integer",
                "description": "How many albums to return",
                "default": 1
            }
        },
        "required": ["query"]
    })
}

/// Searches the review index for albums matching a free-text query.
///
/// # Parameters
///
/// - `query` (required): Free-text description.
/// - `n_results` (optional, default 1): Number of results, capped at the
///   configured maximum. `0` is treated as 1.
pub struct RecommendAlbums {
    index: ReviewIndex,
    max_results: usize,
}

impl RecommendAlbums {
    pub fn new(index: ReviewIndex, max_results: usize) -> Self {
        Self {
            index,
            max_results: max_results.max(1),
        }
    }

    /// Stand-in with the same name and schema that always reports `message`.
    pub fn disabled(message: impl Into<String>) -> DisabledTool {
        DisabledTool::new(NAME, DESCRIPTION, parameters(), message)
    }
}

#[async_trait]
impl Tool for RecommendAlbums {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn parameters(&self) -> Value {
        parameters()
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let query = args.get_string("query")?;
        if query.trim().is_empty() {
            return Err(ToolError::invalid("query", "cannot be empty"));
        }

        let n = (args.get_u64_or("n_results", 1)? as usize).clamp(1, self.max_results);
        let results = self.index.recommend(&query, n).await;

        debug!("recommend_albums('{}', {}) -> {} results", query, n, results.len());

        if results.is_empty() {
            return Ok(ToolOutput::success(NO_MATCHES));
        }

        Ok(ToolOutput::success(serde_json::to_string(&results)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_index::{load_documents, HashingEmbedder, RetrievalResult};
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn index(populate: bool) -> ReviewIndex {
        let index = ReviewIndex::connect_with_pool_size(
            "sqlite::memory:",
            1,
            "music_reviews",
            Arc::new(HashingEmbedder::new(512)),
        )
        .await
        .unwrap();
        index.migrate().await.unwrap();
        index.ensure_collection().await.unwrap();
        if populate {
            let path = concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../review-index/data/music_docs.json"
            );
            index.rebuild(&load_documents(path).unwrap()).await.unwrap();
        }
        index
    }

    fn args(value: Value) -> ToolArgs {
        let params: HashMap<String, Value> = serde_json::from_value(value).unwrap();
        ToolArgs::new(params)
    }

    #[tokio::test]
    async fn test_ambient_textures_two_results() {
        let tool = RecommendAlbums::new(index(true).await, 10);
        let output = tool
            .execute(args(json!({"query": "ambient textures", "n_results": 2})))
            .await
            .unwrap();

        let results: Vec<RetrievalResult> = serde_json::from_str(&output.content).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].similarity >= results[1].similarity);
        assert!(results.iter().all(|r| (0.0..=10.0).contains(&r.score)));
    }

    #[tokio::test]
    async fn test_default_and_cap() {
        let tool = RecommendAlbums::new(index(true).await, 3);

        let output = tool
            .execute(args(json!({"query": "guitar"})))
            .await
            .unwrap();
        let results: Vec<RetrievalResult> = serde_json::from_str(&output.content).unwrap();
        assert_eq!(results.len(), 1);

        let output = tool
            .execute(args(json!({"query": "guitar", "n_results": 50})))
            .await
            .unwrap();
        let results: Vec<RetrievalResult> = serde_json::from_str(&output.content).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_index() {
        let tool = RecommendAlbums::new(index(false).await, 10);
        let output = tool
            .execute(args(json!({"query": "ambient textures"})))
            .await
            .unwrap();
        assert!(output.success);
        assert_eq!(output.content, NO_MATCHES);
    }

    #[tokio::test]
    async fn test_disabled_variant_keeps_schema() {
        let real = RecommendAlbums::new(index(false).await, 10);
        let disabled = RecommendAlbums::disabled("Music tool unavailable");
        assert_eq!(disabled.spec(), real.spec());

        let output = disabled
            .execute(args(json!({"query": "jazz"})))
            .await
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.content, "Music tool unavailable");
    }
}
