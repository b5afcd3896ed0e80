//! Corpus store abstraction for sift-ai-engine
//!
//! The engine publishes documents with their dense vectors to a corpus
//! store and asks it for top-k nearest neighbors at query time. The trait
//! keeps the engine backend-agnostic:
//!
//! ```text
//! CorpusStore ── InMemoryStore   (brute-force cosine, tests + local runs)
//!            └── HttpVectorStore (vector-database REST adapter)
//! ```
//!
//! Store failures are ordinary `Err` values; the orchestrator reacts by
//! degrading the retrieval tier, never by crashing a query.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sift_ai_content::Document;

pub mod http;
pub mod memory;

/// A document paired with its dense vector, ready for publication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPoint {
    pub document: Document,
    pub vector: Vec<f32>,
}

/// A nearest-neighbor candidate with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub document: Document,
    pub score: f32,
}

/// Best-effort store statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub points: usize,
    /// Backend-reported health ("green", "yellow", ...)
    pub status: String,
}

/// Persistent vector storage for one corpus generation.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Insert or replace points, keyed by document id.
    async fn upsert(&self, points: Vec<DocumentPoint>) -> Result<()>;

    /// Drop every stored point. Reindexing resets before republishing so a
    /// generation replaces its predecessor wholesale.
    async fn reset(&self) -> Result<()>;

    /// Top-k candidates by vector similarity, best first.
    async fn nearest_neighbors(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredPoint>>;

    /// Point count and backend-reported health.
    async fn stats(&self) -> Result<StoreStats>;
}
