//! Configuration for the review index.

use std::env;

/// Default SQLite URL.
pub const DEFAULT_DB_URL: &str = "sqlite:data/reviews.db?mode=rwc";

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "music_reviews";

/// Default cap on results per query.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Which embedder backs the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderKind {
    /// Local feature-hashing embedder. No network.
    Hashing { dimension: usize },
    /// OpenAI-compatible `/embeddings` endpoint.
    OpenAi,
}

impl Default for EmbedderKind {
    fn default() -> Self {
        EmbedderKind::Hashing {
            dimension: crate::embedding::DEFAULT_HASHING_DIMENSION,
        }
    }
}

impl EmbedderKind {
    /// Parse `hashing`, `hashing:<dim>` or `openai`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        match value.as_str() {
            "openai" => Some(EmbedderKind::OpenAi),
            "hashing" => Some(EmbedderKind::default()),
            other => other
                .strip_prefix("hashing:")
                .and_then(|d| d.parse().ok())
                .filter(|d: &usize| *d > 0)
                .map(|dimension| EmbedderKind::Hashing { dimension }),
        }
    }
}

/// Configuration for opening a [`crate::ReviewIndex`].
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// SQLite connection URL.
    pub db_url: String,

    /// Collection queried by the index.
    pub collection: String,

    /// Embedder used for building and querying.
    pub embedder: EmbedderKind,

    /// Upper bound on results a single query may return.
    pub max_results: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            embedder: EmbedderKind::default(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl IndexConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `REVIEW_DB_URL` - SQLite URL (default: sqlite:data/reviews.db?mode=rwc)
    /// - `REVIEW_COLLECTION` - Collection name (default: music_reviews)
    /// - `REVIEW_EMBEDDER` - `hashing`, `hashing:<dim>` or `openai` (default: hashing)
    /// - `REVIEW_MAX_RESULTS` - Result cap per query (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let embedder = match env::var("REVIEW_EMBEDDER") {
            Ok(value) => EmbedderKind::parse(&value).unwrap_or_else(|| {
                tracing::warn!("Unknown REVIEW_EMBEDDER '{}', using hashing", value);
                EmbedderKind::default()
            }),
            Err(_) => defaults.embedder,
        };

        Self {
            db_url: env::var("REVIEW_DB_URL").unwrap_or(defaults.db_url),
            collection: env::var("REVIEW_COLLECTION").unwrap_or(defaults.collection),
            embedder,
            max_results: env::var("REVIEW_MAX_RESULTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_results),
        }
    }

    /// Create a new config builder.
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }
}

/// Builder for IndexConfig.
#[derive(Debug, Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    pub fn db_url(mut self, url: impl Into<String>) -> Self {
        self.config.db_url = url.into();
        self
    }

    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    pub fn embedder(mut self, kind: EmbedderKind) -> Self {
        self.config.embedder = kind;
        self
    }

    pub fn max_results(mut self, n: usize) -> Self {
        self.config.max_results = n.max(1);
        self
    }

    pub fn build(self) -> IndexConfig {
        self.config
    }
}
