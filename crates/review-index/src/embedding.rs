//! Text embedders.
//!
//! An [`Embedder`] turns text into a dense vector. The same embedder must be
//! used to build a collection and to query it; the collection records the
//! model id and dimension it was built with.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{IndexError, Result};

/// Backend trait for computing text embeddings.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text input into a dense vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts. Default implementation calls `embed` per item.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Dimensionality of the output vectors.
    fn dimension(&self) -> usize;

    /// Model identifier stored alongside the collection.
    fn model_id(&self) -> &str;
}

/// Default dimension for [`HashingEmbedder`].
pub const DEFAULT_HASHING_DIMENSION: usize = 256;

/// Local, deterministic bag-of-words embedder.
///
/// Each lowercase word (and each adjacent word pair) is hashed with SHA-256
/// into one of `dimension` buckets with a sign taken from the hash, then the
/// vector is L2-normalized. Texts sharing vocabulary land close together,
/// identical texts produce identical vectors, and nothing leaves the process.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_id: format!("hashing-bow-{}", dimension),
        }
    }

    fn tokens(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = Sha256::digest(feature.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&hash[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
        let sign = if hash[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens = Self::tokens(text);

        for token in &tokens {
            self.accumulate(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.accumulate(&mut vector, &format!("{} {}", pair[0], pair[1]), 0.5);
        }

        normalize(&mut vector);
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Default OpenAI embeddings model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Dimension of [`DEFAULT_EMBEDDING_MODEL`].
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

/// Configuration for [`OpenAiEmbedder`].
#[derive(Debug, Clone)]
pub struct OpenAiEmbedderConfig {
    pub api_url: String,
    pub api_key: String,
    /// Send the key as `x-api-key` instead of a bearer token.
    pub use_api_key_header: bool,
    pub model: String,
    pub dimension: usize,
    pub timeout: Duration,
}

impl Default for OpenAiEmbedderConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            use_api_key_header: false,
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimension: DEFAULT_EMBEDDING_DIMENSION,
            timeout: Duration::from_secs(30),
        }
    }
}

impl OpenAiEmbedderConfig {
    /// Load configuration from environment variables.
    ///
    /// A non-blank `API_GATEWAY_KEY` takes precedence over `OPENAI_API_KEY`
    /// and switches to the `x-api-key` header. `OPENAI_API_URL`, `OPENAI_EMBEDDING_MODEL`
    /// and `OPENAI_EMBEDDING_DIMENSION` override the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        match std::env::var("API_GATEWAY_KEY") {
            Ok(key) if !key.trim().is_empty() => {
                config.api_key = key;
                config.use_api_key_header = true;
            }
            _ => {
                if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                    if !key.trim().is_empty() {
                        config.api_key = key;
                    }
                }
            }
        }
        if let Ok(url) = std::env::var("OPENAI_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("OPENAI_EMBEDDING_MODEL") {
            config.model = model;
        }
        if let Some(dimension) = std::env::var("OPENAI_EMBEDDING_DIMENSION")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.dimension = dimension;
        }

        config
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    config: OpenAiEmbedderConfig,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiEmbedderConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(IndexError::Embedding(
                "API key is required (set API_GATEWAY_KEY or OPENAI_API_KEY)".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IndexError::Embedding(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OpenAiEmbedderConfig::from_env())
    }

    async fn request(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.api_url);
        let body = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        };

        let builder = self.client.post(&url).json(&body);
        let builder = if self.config.use_api_key_header {
            builder.header("x-api-key", &self.config.api_key)
        } else {
            builder.bearer_auth(&self.config.api_key)
        };

        let response = builder
            .send()
            .await
            .map_err(|e| IndexError::Embedding(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IndexError::Embedding(format!(
                "embeddings endpoint returned {}: {}",
                status, text
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Embedding(format!("malformed response: {}", e)))?;

        if parsed.data.len() != texts.len() {
            return Err(IndexError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);
        debug!(count = parsed.data.len(), "Received embeddings");

        parsed
            .data
            .into_iter()
            .map(|d| {
                if d.embedding.len() != self.config.dimension {
                    return Err(IndexError::DimensionMismatch {
                        expected: self.config.dimension,
                        actual: d.embedding.len(),
                    });
                }
                Ok(d.embedding)
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| IndexError::Embedding("empty embeddings response".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

/// L2-normalize in place. Zero vectors are left untouched.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Cosine similarity between two vectors. Zero vectors have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Cosine distance, `1 - similarity`, in [0, 2].
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

pub(crate) fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub(crate) fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const KEY_VARS: [&str; 2] = ["API_GATEWAY_KEY", "OPENAI_API_KEY"];

    #[tokio::test]
    async fn test_hashing_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("slow ambient drones").await.unwrap();
        let b = embedder.embed("slow ambient drones").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_hashing_is_case_insensitive() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("Ambient Textures").await.unwrap();
        let b = embedder.embed("ambient textures!").await.unwrap();
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_is_closer() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed("ambient textures").await.unwrap();
        let near = embedder
            .embed("calm ambient textures and drones")
            .await
            .unwrap();
        let far = embedder
            .embed("fast thrash metal riffs and drums")
            .await
            .unwrap();

        assert!(cosine_similarity(&query, &near) > cosine_similarity(&query, &far));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        let v = embedder.embed("   ").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
        assert_eq!(cosine_distance(&v, &v), 1.0);
    }

    #[test]
    fn test_model_id_includes_dimension() {
        assert_eq!(HashingEmbedder::new(32).model_id(), "hashing-bow-32");
    }

    #[test]
    fn test_vector_blob_encoding() {
        let v = vec![0.25f32, -1.5, 3.0];
        assert_eq!(decode_vector(&encode_vector(&v)), v);
    }

    #[test]
    fn test_openai_embedder_requires_key() {
        let config = OpenAiEmbedderConfig::default();
        assert!(OpenAiEmbedder::new(config).is_err());
    }

    #[test]
    fn test_blank_gateway_key_falls_back_to_openai_key() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("API_GATEWAY_KEY", "");
        std::env::set_var("OPENAI_API_KEY", "sk-test");

        let config = OpenAiEmbedderConfig::from_env();
        assert_eq!(config.api_key, "sk-test");
        assert!(!config.use_api_key_header);
        assert!(OpenAiEmbedder::new(config).is_ok());

        for var in KEY_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_gateway_key_takes_precedence() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("API_GATEWAY_KEY", "gw-test");
        std::env::set_var("OPENAI_API_KEY", "sk-test");

        let config = OpenAiEmbedderConfig::from_env();
        assert_eq!(config.api_key, "gw-test");
        assert!(config.use_api_key_header);

        for var in KEY_VARS {
            std::env::remove_var(var);
        }
    }
}
