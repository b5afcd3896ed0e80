//! Dense vector provider implementations

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for providers that turn text into fixed-length dense vectors.
///
/// Implementations must hold the dimension fixed: every vector from one
/// provider instance has `dimension()` components, and callers mixing
/// documents and queries rely on that.
#[async_trait]
pub trait DenseVectorProvider: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed multiple texts, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimensionality of every vector this provider produces
    fn dimension(&self) -> usize;

    /// Name/identifier of this provider
    fn provider_name(&self) -> &str;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// HTTP client for an OpenAI-compatible `POST /embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingClient {
    config: EmbedConfig,
    client: reqwest::Client,
}

impl HttpEmbeddingClient {
    pub fn new(config: EmbedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    async fn request_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.api_base);
        let mut request = self.client.post(&url).json(&EmbeddingRequest {
            model: &self.config.model,
            input: texts,
        });
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbedError::api(status.as_u16(), message));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(EmbedError::EmptyResponse);
        }
        parsed
            .data
            .into_iter()
            .map(|data| self.validate(data.embedding))
            .collect()
    }

    fn validate(&self, vector: Vec<f32>) -> Result<Vec<f32>> {
        if vector.is_empty() {
            return Err(EmbedError::EmptyResponse);
        }
        if vector.len() != self.config.dimension {
            return Err(EmbedError::DimensionMismatch {
                expected: self.config.dimension,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|component| !component.is_finite()) {
            return Err(EmbedError::NonFinite);
        }
        Ok(vector)
    }
}

#[async_trait]
impl DenseVectorProvider for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_owned()];
        let mut vectors = self.request_batch(&texts).await?;
        vectors.pop().ok_or(EmbedError::EmptyResponse)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!("embedding {} texts", texts.len());

        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.config.batch_size) {
            all.extend(self.request_batch(chunk).await?);
        }
        Ok(all)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn provider_name(&self) -> &str {
        "http-embeddings"
    }
}
