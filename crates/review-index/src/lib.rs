//! SQLite-backed vector index over album reviews.
//!
//! Reviews are stored with their metadata and embedding in a single row, grouped
//! into named collections. Similarity search is a brute-force cosine scan over
//! one collection, which is plenty for the few thousand reviews a collection
//! holds.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use review_index::{HashingEmbedder, ReviewIndex, load_documents};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let embedder = Arc::new(HashingEmbedder::default());
//!     let index = ReviewIndex::connect("sqlite:data/reviews.db?mode=rwc", "music_reviews", embedder).await?;
//!     index.migrate().await?;
//!
//!     let records = load_documents("data/music_docs.json")?;
//!     index.rebuild(&records).await?;
//!
//!     for hit in index.recommend("ambient textures", 2).await {
//!         println!("{} - {} ({:.1})", hit.artist, hit.title, hit.score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod collection;
pub mod config;
pub mod embedding;
pub mod error;
pub mod models;
pub mod validation;

pub use config::{EmbedderKind, IndexConfig, IndexConfigBuilder};
pub use embedding::{
    cosine_distance, cosine_similarity, Embedder, HashingEmbedder, OpenAiEmbedder,
    OpenAiEmbedderConfig,
};
pub use error::{IndexError, Result};
pub use models::{CollectionInfo, RetrievalResult, ReviewRecord};
pub use validation::{load_documents, validate_record, validate_records, ValidationError};

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use embedding::{decode_vector, encode_vector};

/// Build the embedder described by `kind`.
pub fn build_embedder(kind: EmbedderKind) -> Result<Arc<dyn Embedder>> {
    Ok(match kind {
        EmbedderKind::Hashing { dimension } => Arc::new(HashingEmbedder::new(dimension)),
        EmbedderKind::OpenAi => Arc::new(OpenAiEmbedder::from_env()?),
    })
}

/// Handle on one named collection of reviews.
#[derive(Clone)]
pub struct ReviewIndex {
    pool: SqlitePool,
    collection: String,
    embedder: Arc<dyn Embedder>,
}

impl ReviewIndex {
    /// Default pool size for index connections.
    const DEFAULT_POOL_SIZE: u32 = 5;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    pub async fn connect(
        url: &str,
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE, collection, embedder).await
    }

    /// Connect with a custom pool size.
    ///
    /// In-memory databases need a pool size of 1 so every query sees the
    /// same database.
    pub async fn connect_with_pool_size(
        url: &str,
        pool_size: u32,
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        let collection = collection.into();
        info!(
            "Connected to review index: {} (collection: {}, embedder: {})",
            url,
            collection,
            embedder.model_id()
        );

        Ok(Self {
            pool,
            collection,
            embedder,
        })
    }

    /// Open the index described by `config`: build the embedder, connect,
    /// migrate and make sure the collection exists.
    pub async fn open(config: &IndexConfig) -> Result<Self> {
        let embedder = build_embedder(config.embedder)?;
        let index = Self::connect(&config.db_url, config.collection.clone(), embedder).await?;
        index.migrate().await?;
        index.ensure_collection().await?;
        Ok(index)
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        info!("Running review index migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Name of the collection this handle reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The embedder used for indexing and queries.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Create the collection if missing. Returns `true` if it was created.
    pub async fn ensure_collection(&self) -> Result<bool> {
        let created = collection::ensure_collection(
            &self.pool,
            &self.collection,
            self.embedder.model_id(),
            self.embedder.dimension(),
        )
        .await?;

        if created {
            info!("Created collection '{}'", self.collection);
        } else {
            debug!("Collection '{}' already exists", self.collection);
        }
        Ok(created)
    }

    /// All collections in the database.
    pub async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        collection::list_collections(&self.pool).await
    }

    /// Wipe the collection and repopulate it from `records`.
    ///
    /// Validation and embedding happen before anything is written; the wipe
    /// and inserts share one transaction, so a failed rebuild leaves the old
    /// contents in place. Rebuilding twice with the same input yields the
    /// same collection.
    pub async fn rebuild(&self, records: &[ReviewRecord]) -> Result<usize> {
        validate_records(records)?;

        let texts: Vec<&str> = records.iter().map(|r| r.review.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        let dimension = self.embedder.dimension();

        if vectors.len() != records.len() {
            return Err(IndexError::Embedding(format!(
                "expected {} embeddings, got {}",
                records.len(),
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM reviews WHERE collection = ?")
            .bind(&self.collection)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM collections WHERE name = ?")
            .bind(&self.collection)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO collections (name, embedding_model, dimension)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&self.collection)
        .bind(self.embedder.model_id())
        .bind(dimension as i64)
        .execute(&mut *tx)
        .await?;

        for (record, vector) in records.iter().zip(vectors.iter()) {
            sqlx::query(
                r#"
                INSERT INTO reviews (collection, id, artist, title, year, score, review, embedding)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&self.collection)
            .bind(&record.id)
            .bind(&record.artist)
            .bind(&record.title)
            .bind(record.year)
            .bind(record.score)
            .bind(&record.review)
            .bind(encode_vector(vector))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            "Rebuilt collection '{}' with {} reviews",
            self.collection,
            records.len()
        );
        Ok(records.len())
    }

    /// Get one review by id.
    pub async fn get(&self, id: &str) -> Result<Option<ReviewRecord>> {
        let record = sqlx::query_as::<_, ReviewRecord>(
            r#"
            SELECT id, artist, title, year, score, review
            FROM reviews
            WHERE collection = ? AND id = ?
            "#,
        )
        .bind(&self.collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Number of reviews in the collection.
    pub async fn count(&self) -> Result<usize> {
        collection::count_reviews(&self.pool, &self.collection).await
    }

    /// The `k` nearest reviews to `query`, as `(id, cosine distance)`,
    /// nearest first. Ties are broken by id.
    pub async fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<(String, f32)>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let info = collection::get_collection(&self.pool, &self.collection).await?;
        if query.len() != info.dimension as usize {
            return Err(IndexError::DimensionMismatch {
                expected: info.dimension as usize,
                actual: query.len(),
            });
        }

        let rows: Vec<(String, Vec<u8>)> =
            sqlx::query_as("SELECT id, embedding FROM reviews WHERE collection = ?")
                .bind(&self.collection)
                .fetch_all(&self.pool)
                .await?;

        let mut scored: Vec<(String, f32)> = rows
            .into_iter()
            .filter_map(|(id, blob)| {
                let vector = decode_vector(&blob);
                if vector.len() != query.len() {
                    warn!("Skipping review {} with {} dimensions", id, vector.len());
                    return None;
                }
                Some((id, cosine_distance(query, &vector)))
            })
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Recommend up to `n` reviews similar to `query`, nearest first.
    ///
    /// Never fails: an empty, missing or unreachable index yields an empty
    /// list. `n = 0` is treated as 1.
    pub async fn recommend(&self, query: &str, n: usize) -> Vec<RetrievalResult> {
        match self.try_recommend(query, n.max(1)).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Recommendation failed, returning no results: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_recommend(&self, query: &str, n: usize) -> Result<Vec<RetrievalResult>> {
        let info = collection::get_collection(&self.pool, &self.collection).await?;
        if info.embedding_model != self.embedder.model_id() {
            return Err(IndexError::ModelMismatch {
                collection: self.collection.clone(),
                stored: info.embedding_model,
                current: self.embedder.model_id().to_string(),
            });
        }

        let vector = self.embedder.embed(query).await?;
        let hits = self.nearest(&vector, n).await?;

        let mut results = Vec::with_capacity(hits.len());
        for (id, distance) in hits {
            if let Some(record) = self.get(&id).await? {
                results.push(RetrievalResult::from_record(record, 1.0 - distance));
            }
        }

        debug!(
            query_len = query.len(),
            results = results.len(),
            "Recommendation query complete"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_index() -> ReviewIndex {
        let embedder = Arc::new(HashingEmbedder::new(512));
        let index = ReviewIndex::connect_with_pool_size("sqlite::memory:", 1, "test_reviews", embedder)
            .await
            .unwrap();
        index.migrate().await.unwrap();
        index
    }

    fn sample_records() -> Vec<ReviewRecord> {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/music_docs.json");
        load_documents(path).unwrap()
    }

    #[tokio::test]
    async fn test_ensure_collection_is_idempotent() {
        let index = test_index().await;
        assert!(index.ensure_collection().await.unwrap());
        assert!(!index.ensure_collection().await.unwrap());

        let collections = index.list_collections().await.unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].name, "test_reviews");
        assert_eq!(collections[0].embedding_model, "hashing-bow-512");
        assert_eq!(collections[0].dimension, 512);
    }

    #[tokio::test]
    async fn test_empty_index_recommends_nothing() {
        let index = test_index().await;
        assert!(index.recommend("ambient textures", 3).await.is_empty());

        index.ensure_collection().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
        assert!(index.recommend("ambient textures", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_is_idempotent() {
        let index = test_index().await;
        let records = sample_records();

        assert_eq!(index.rebuild(&records).await.unwrap(), records.len());
        assert_eq!(index.rebuild(&records).await.unwrap(), records.len());
        assert_eq!(index.count().await.unwrap(), records.len());

        let stored = index.get(&records[0].id).await.unwrap().unwrap();
        assert_eq!(stored, records[0]);
        assert!(index.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rebuild_replaces_contents() {
        let index = test_index().await;
        let records = sample_records();
        index.rebuild(&records).await.unwrap();
        index.rebuild(&records[..2]).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 2);
        assert!(index.get(&records[5].id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_rebuild_keeps_old_contents() {
        let index = test_index().await;
        let records = sample_records();
        index.rebuild(&records).await.unwrap();

        let mut bad = records.clone();
        bad[1].score = 11.0;
        assert!(matches!(
            index.rebuild(&bad).await,
            Err(IndexError::InvalidRecord { .. })
        ));
        assert_eq!(index.count().await.unwrap(), records.len());
    }

    #[tokio::test]
    async fn test_recommend_respects_limit_and_order() {
        let index = test_index().await;
        index.rebuild(&sample_records()).await.unwrap();

        for n in [1, 3, 50] {
            let results = index.recommend("electronic beats", n).await;
            assert!(results.len() <= n);
            assert!(!results.is_empty());
            for pair in results.windows(2) {
                assert!(pair[0].similarity >= pair[1].similarity);
            }
        }
    }

    #[tokio::test]
    async fn test_zero_results_treated_as_one() {
        let index = test_index().await;
        index.rebuild(&sample_records()).await.unwrap();
        assert_eq!(index.recommend("guitar", 0).await.len(), 1);
    }

    #[tokio::test]
    async fn test_review_text_finds_its_own_record() {
        let index = test_index().await;
        let records = sample_records();
        index.rebuild(&records).await.unwrap();

        for record in &records {
            let results = index.recommend(&record.review, 1).await;
            assert_eq!(results[0].title, record.title);
            assert_eq!(results[0].artist, record.artist);
            assert_eq!(results[0].score, record.score);
        }
    }

    #[tokio::test]
    async fn test_ambient_textures_query() {
        let index = test_index().await;
        index.rebuild(&sample_records()).await.unwrap();

        let results = index.recommend("ambient textures", 2).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].similarity >= results[1].similarity);
        for result in &results {
            assert!((0.0..=10.0).contains(&result.score));
            assert!(result.review.to_lowercase().contains("ambient"));
        }
    }

    #[tokio::test]
    async fn test_nearest_rejects_wrong_dimension() {
        let index = test_index().await;
        index.rebuild(&sample_records()).await.unwrap();

        let err = index.nearest(&[1.0, 0.0], 3).await.unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 512,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_model_mismatch_yields_no_results() {
        let index = test_index().await;
        index.rebuild(&sample_records()).await.unwrap();

        let other = ReviewIndex {
            pool: index.pool().clone(),
            collection: index.collection().to_string(),
            embedder: Arc::new(HashingEmbedder::new(64)),
        };
        assert!(other.recommend("ambient textures", 2).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_collection() {
        let index = test_index().await;
        index.rebuild(&sample_records()).await.unwrap();

        assert!(collection::delete_collection(index.pool(), "test_reviews")
            .await
            .unwrap());
        assert_eq!(index.count().await.unwrap(), 0);
        assert!(index.list_collections().await.unwrap().is_empty());
    }
}
