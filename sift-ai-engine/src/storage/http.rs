//! Vector-database REST adapter.
//!
//! Speaks the collection/points dialect of qdrant-style vector stores:
//! ensure a cosine-distance collection, upsert points in batches with the
//! full document as payload, and run top-k searches. Wire compatibility
//! with any one store build is out of scope; the engine relies only on the
//! operations modeled here.

use super::{CorpusStore, DocumentPoint, ScoredPoint, StoreStats};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use fnv::FnvHasher;
use serde::Deserialize;
use serde_json::json;
use sift_ai_content::Document;
use std::hash::Hasher;
use std::time::Duration;

const UPSERT_BATCH: usize = 100;
const STORE_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for one named collection of a vector database.
#[derive(Debug, Clone)]
pub struct HttpVectorStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
    dimension: usize,
}

impl HttpVectorStore {
    pub fn new(
        base_url: impl Into<String>,
        collection: impl Into<String>,
        dimension: usize,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(STORE_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: None,
            collection: collection.into(),
            dimension,
        })
    }

    /// Send an `api-key` header with every request (builder style).
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(api_key) => request.header("api-key", api_key),
            None => request,
        }
    }

    /// Create the collection when it does not exist yet.
    pub async fn ensure_collection(&self) -> Result<()> {
        let response = self
            .authorized(self.client.get(self.collection_url()))
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(());
        }

        tracing::info!("creating collection '{}'", self.collection);
        let body = json!({
            "vectors": { "size": self.dimension, "distance": "Cosine" }
        });
        let response = self
            .authorized(self.client.put(self.collection_url()).json(&body))
            .send()
            .await?;
        ensure_success(response, "create collection").await
    }

    /// Delete the collection; missing collections are not an error.
    pub async fn delete_collection(&self) -> Result<()> {
        let response = self
            .authorized(self.client.delete(self.collection_url()))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success(response, "delete collection").await
    }
}

async fn ensure_success(response: reqwest::Response, action: &str) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(anyhow!("{action} failed with status {status}: {body}"))
    }
}

/// Stable numeric id for a document, so re-upserting the same document
/// overwrites its point instead of duplicating it.
fn point_id(document_id: &str) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(document_id.as_bytes());
    hasher.finish()
}

#[derive(Deserialize)]
struct SearchEnvelope {
    result: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    score: f32,
    payload: Document,
}

#[derive(Deserialize)]
struct CollectionEnvelope {
    result: CollectionInfo,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CollectionInfo {
    points_count: Option<usize>,
    status: Option<String>,
}

#[async_trait]
impl CorpusStore for HttpVectorStore {
    async fn upsert(&self, points: Vec<DocumentPoint>) -> Result<()> {
        self.ensure_collection().await?;

        let total_batches = points.len().div_ceil(UPSERT_BATCH).max(1);
        for (batch_index, batch) in points.chunks(UPSERT_BATCH).enumerate() {
            let body = json!({
                "points": batch
                    .iter()
                    .map(|point| json!({
                        "id": point_id(&point.document.id),
                        "vector": point.vector,
                        "payload": point.document,
                    }))
                    .collect::<Vec<_>>()
            });
            let url = format!("{}/points", self.collection_url());
            let response = self
                .authorized(self.client.put(&url).query(&[("wait", "true")]).json(&body))
                .send()
                .await?;
            ensure_success(response, "upsert points").await?;
            tracing::debug!("upserted batch {}/{}", batch_index + 1, total_batches);
        }
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        self.delete_collection().await?;
        self.ensure_collection().await
    }

    async fn nearest_neighbors(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredPoint>> {
        let url = format!("{}/points/search", self.collection_url());
        let body = json!({ "vector": vector, "limit": k, "with_payload": true });
        let response = self
            .authorized(self.client.post(&url).json(&body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("vector search failed with status {status}: {text}"));
        }

        let envelope: SearchEnvelope = response
            .json()
            .await
            .context("malformed vector search response")?;
        Ok(envelope
            .result
            .into_iter()
            .map(|hit| ScoredPoint {
                document: hit.payload,
                score: hit.score,
            })
            .collect())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let response = self
            .authorized(self.client.get(self.collection_url()))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("collection info failed with status {status}"));
        }

        let envelope: CollectionEnvelope = response
            .json()
            .await
            .context("malformed collection info response")?;
        Ok(StoreStats {
            points: envelope.result.points_count.unwrap_or(0),
            status: envelope
                .result
                .status
                .unwrap_or_else(|| "unknown".to_owned()),
        })
    }
}
