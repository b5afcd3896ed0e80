//! Integration tests for the retrieval orchestrator's tier behavior.
//!
//! These drive a real engine against scripted collaborators:
//! - a deterministic dense provider (letter-frequency vectors)
//! - a dense provider that always fails
//! - the in-memory corpus store, plus one that always fails
//!
//! Covered: tier selection and fallback, result-shape invariants, input
//! validation, reindex generation replacement, and idempotence.

use async_trait::async_trait;
use sift_ai_content::{Document, DocumentMetadata};
use sift_ai_embed::{DenseVectorProvider, EmbedError};
use sift_ai_engine::config::EngineConfig;
use sift_ai_engine::search::{QueryError, Retrieval, RetrievalTier, SearchEngine};
use sift_ai_engine::storage::memory::InMemoryStore;
use sift_ai_engine::storage::{CorpusStore, DocumentPoint, ScoredPoint, StoreStats};
use std::sync::Arc;
use tracing_test::traced_test;

const DIMENSION: usize = 26;

/// Letter-frequency embedding: deterministic, order-free, and similar texts
/// land near each other, which is all these tests need.
fn letter_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIMENSION];
    for c in text.to_lowercase().chars() {
        if c.is_ascii_lowercase() {
            vector[(c as u8 - b'a') as usize] += 1.0;
        }
    }
    vector
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

struct StaticDense;

#[async_trait]
impl DenseVectorProvider for StaticDense {
    async fn embed(&self, text: &str) -> sift_ai_embed::Result<Vec<f32>> {
        Ok(letter_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> sift_ai_embed::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| letter_vector(text)).collect())
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn provider_name(&self) -> &str {
        "static-test"
    }
}

struct FailingDense;

#[async_trait]
impl DenseVectorProvider for FailingDense {
    async fn embed(&self, _text: &str) -> sift_ai_embed::Result<Vec<f32>> {
        Err(EmbedError::api(503, "embedding service down"))
    }

    async fn embed_batch(&self, _texts: &[String]) -> sift_ai_embed::Result<Vec<Vec<f32>>> {
        Err(EmbedError::api(503, "embedding service down"))
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn provider_name(&self) -> &str {
        "failing-test"
    }
}

struct FailingStore;

#[async_trait]
impl CorpusStore for FailingStore {
    async fn upsert(&self, _points: Vec<DocumentPoint>) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("store down"))
    }

    async fn reset(&self) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("store down"))
    }

    async fn nearest_neighbors(
        &self,
        _vector: &[f32],
        _k: usize,
    ) -> anyhow::Result<Vec<ScoredPoint>> {
        Err(anyhow::anyhow!("store down"))
    }

    async fn stats(&self) -> anyhow::Result<StoreStats> {
        Err(anyhow::anyhow!("store down"))
    }
}

fn doc(id: &str, title: &str, excerpt: &str, content: &str) -> Document {
    Document {
        id: id.to_owned(),
        title: title.to_owned(),
        url: format!("https://example.com/{id}"),
        excerpt: excerpt.to_owned(),
        content: content.to_owned(),
        word_count: content.split_whitespace().count(),
        metadata: DocumentMetadata::default(),
    }
}

fn corpus() -> Vec<Document> {
    vec![
        doc(
            "1",
            "Recycling Guide",
            "Where your waste goes",
            "recycling and waste management services for the city",
        ),
        doc(
            "2",
            "Solar Panels",
            "Rooftop power",
            "community solar panel installation guide",
        ),
        doc(
            "3",
            "Stormwater",
            "Runoff basics",
            "stormwater runoff management plan",
        ),
    ]
}

fn healthy_engine() -> SearchEngine {
    SearchEngine::new(
        Arc::new(StaticDense),
        Arc::new(InMemoryStore::new()),
        EngineConfig::default(),
    )
}

/// Every result list must be sorted, bounded, and consistently labelled.
fn assert_well_formed(retrieval: &Retrieval, limit: usize) {
    assert!(retrieval.results.len() <= limit);
    for pair in retrieval.results.windows(2) {
        assert!(pair[0].score >= pair[1].score, "scores must be non-increasing");
    }
    for result in &retrieval.results {
        let expected = sift_ai_engine::search::Relevance::from_score(result.score);
        assert_eq!(result.relevance, expected, "relevance must match score");
    }
}

#[tokio::test]
async fn hybrid_tier_serves_when_all_collaborators_are_healthy() {
    let engine = healthy_engine();
    let report = engine.reindex(corpus()).await;
    assert!(report.dense_published);
    assert_eq!(report.generation, 1);
    assert_eq!(report.documents, 3);

    let retrieval = engine
        .retrieve("waste management recycling", 2)
        .await
        .unwrap();
    assert_eq!(retrieval.tier, RetrievalTier::Hybrid);
    assert!(!retrieval.tier.is_degraded());
    assert!(!retrieval.results.is_empty());
    assert_well_formed(&retrieval, 2);
}

#[tokio::test]
async fn hybrid_without_sparse_signal_reports_dense_score_unscaled() {
    // Vocabulary disabled: no lexical model fits, so the hybrid tier runs
    // on the dense signal alone. That score must pass through exactly as
    // the store reported it, not multiplied by the dense weight.
    let config = EngineConfig {
        max_vocab_terms: 0,
        ..EngineConfig::default()
    };
    let engine = SearchEngine::new(Arc::new(StaticDense), Arc::new(InMemoryStore::new()), config);
    engine.reindex(corpus()).await;

    let query = "waste management recycling";
    let retrieval = engine.retrieve(query, 3).await.unwrap();
    assert_eq!(retrieval.tier, RetrievalTier::Hybrid);

    for result in &retrieval.results {
        let document = corpus()
            .into_iter()
            .find(|candidate| candidate.id == result.id)
            .unwrap();
        let expected = cosine(&letter_vector(query), &letter_vector(&document.combined_text()));
        assert!(
            (result.score - expected).abs() < 1e-6,
            "dense-only score must not be rescaled: got {}, expected {expected}",
            result.score
        );
    }
}

#[tokio::test]
#[traced_test]
async fn dense_failure_falls_back_to_sparse_ranking() {
    let engine = SearchEngine::new(
        Arc::new(FailingDense),
        Arc::new(InMemoryStore::new()),
        EngineConfig::default(),
    );
    let report = engine.reindex(corpus()).await;
    assert!(!report.dense_published, "embedding failed, store must lag");

    let retrieval = engine.retrieve("waste management", 5).await.unwrap();
    assert_eq!(retrieval.tier, RetrievalTier::SparseOnly);
    assert!(retrieval.tier.is_degraded());
    assert_well_formed(&retrieval, 5);

    // Lexical similarity only: the waste-management document wins and no
    // cosine can exceed 1.0.
    assert_eq!(retrieval.results[0].id, "1");
    assert!(retrieval.results.iter().all(|r| r.score > 0.0 && r.score <= 1.0));

    assert!(logs_contain("dense embedding unavailable"));
}

#[tokio::test]
async fn store_failure_falls_back_to_sparse_ranking() {
    let engine = SearchEngine::new(
        Arc::new(StaticDense),
        Arc::new(FailingStore),
        EngineConfig::default(),
    );
    let report = engine.reindex(corpus()).await;
    assert!(!report.dense_published, "publish failed, store must lag");

    let retrieval = engine.retrieve("waste management", 5).await.unwrap();
    assert_eq!(retrieval.tier, RetrievalTier::SparseOnly);
    assert_eq!(retrieval.results[0].id, "1");
}

#[tokio::test]
async fn substring_tier_finds_unique_title_match() {
    // No lexical model (vocabulary disabled) and no dense signal: the
    // terminal fallback scans raw fields.
    let config = EngineConfig {
        max_vocab_terms: 0,
        ..EngineConfig::default()
    };
    let engine = SearchEngine::new(Arc::new(FailingDense), Arc::new(InMemoryStore::new()), config);
    engine
        .reindex(vec![
            doc("1", "Home Energy Audit Checklist", "", "walkthrough for homeowners"),
            doc("2", "Composting", "", "compost pile maintenance"),
            doc("3", "Rain Barrels", "", "collect rainwater at home"),
        ])
        .await;

    let retrieval = engine.retrieve("energy audit", 10).await.unwrap();
    assert_eq!(retrieval.tier, RetrievalTier::Substring);
    assert_eq!(retrieval.results.len(), 1);
    assert_eq!(retrieval.results[0].id, "1");
    assert_eq!(retrieval.results[0].relevance.as_str(), "high");
    assert!((retrieval.results[0].score - 1.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn substring_tier_weights_title_over_content() {
    let config = EngineConfig {
        max_vocab_terms: 0,
        ..EngineConfig::default()
    };
    let engine = SearchEngine::new(Arc::new(FailingDense), Arc::new(InMemoryStore::new()), config);
    engine
        .reindex(vec![
            doc("title-hit", "Solar Power", "", "solar arrays on rooftops"),
            doc("body-hit", "Rooftop Guide", "", "mentions solar once"),
            doc("no-hit", "Composting", "", "compost pile maintenance"),
        ])
        .await;

    let retrieval = engine.retrieve("solar", 10).await.unwrap();
    assert_eq!(retrieval.tier, RetrievalTier::Substring);
    assert_eq!(retrieval.results.len(), 2);
    assert_eq!(retrieval.results[0].id, "title-hit");
    assert!((retrieval.results[0].score - 1.0).abs() < f32::EPSILON);
    assert_eq!(retrieval.results[1].id, "body-hit");
    assert!(retrieval.results[1].score < retrieval.results[0].score);
    assert_well_formed(&retrieval, 10);
}

#[tokio::test]
async fn empty_corpus_yields_empty_results_not_errors() {
    // Fully degraded: no corpus, no model, no dense signal.
    let engine = SearchEngine::new(
        Arc::new(FailingDense),
        Arc::new(InMemoryStore::new()),
        EngineConfig::default(),
    );
    let retrieval = engine.retrieve("anything", 10).await.unwrap();
    assert_eq!(retrieval.tier, RetrievalTier::Substring);
    assert!(retrieval.results.is_empty());

    // Healthy collaborators but an empty store behave the same way.
    let engine = healthy_engine();
    let retrieval = engine.retrieve("anything", 10).await.unwrap();
    assert_eq!(retrieval.tier, RetrievalTier::Hybrid);
    assert!(retrieval.results.is_empty());
}

#[tokio::test]
async fn malformed_input_is_rejected_before_retrieval() {
    let engine = healthy_engine();
    engine.reindex(corpus()).await;

    assert_eq!(
        engine.retrieve("", 5).await.unwrap_err(),
        QueryError::EmptyQuery
    );
    assert_eq!(
        engine.retrieve("   ", 5).await.unwrap_err(),
        QueryError::EmptyQuery
    );
    assert_eq!(
        engine.retrieve("ok", 0).await.unwrap_err(),
        QueryError::LimitOutOfRange { limit: 0, max: 50 }
    );
    assert_eq!(
        engine.retrieve("ok", 51).await.unwrap_err(),
        QueryError::LimitOutOfRange { limit: 51, max: 50 }
    );
}

#[tokio::test]
async fn reindex_replaces_the_previous_generation() {
    let engine = healthy_engine();
    engine.reindex(corpus()).await;

    let before = engine.retrieve("waste management", 5).await.unwrap();
    assert!(before.results.iter().any(|result| result.id == "1"));

    let report = engine
        .reindex(vec![
            doc("10", "Bike Lanes", "", "new bike lane network downtown"),
            doc("11", "Tree Planting", "", "street tree planting program"),
        ])
        .await;
    assert_eq!(report.generation, 2);

    let after = engine.retrieve("waste management", 5).await.unwrap();
    assert_eq!(after.generation, 2);
    assert!(
        after.results.iter().all(|result| result.id != "1"),
        "documents from the replaced generation must not resurface"
    );
}

#[tokio::test]
async fn identical_queries_against_one_generation_are_idempotent() {
    let engine = healthy_engine();
    engine.reindex(corpus()).await;

    let first = engine.retrieve("management services", 3).await.unwrap();
    let second = engine.retrieve("management services", 3).await.unwrap();

    assert_eq!(first.tier, second.tier);
    assert_eq!(first.generation, second.generation);
    assert_eq!(first.results.len(), second.results.len());
    for (a, b) in first.results.iter().zip(&second.results) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.score, b.score);
        assert_eq!(a.relevance, b.relevance);
    }
}

#[tokio::test]
async fn stats_track_corpus_model_and_store() {
    let engine = healthy_engine();

    let stats = engine.stats().await;
    assert_eq!(stats.document_count, 0);
    assert!(!stats.model_fitted);
    assert_eq!(stats.generation, 0);
    assert_eq!(stats.store_points, Some(0));

    engine.reindex(corpus()).await;
    let stats = engine.stats().await;
    assert_eq!(stats.document_count, 3);
    assert!(stats.model_fitted);
    assert_eq!(stats.generation, 1);
    assert_eq!(stats.store_points, Some(3));
}

#[tokio::test]
async fn stats_survive_an_unreachable_store() {
    let engine = SearchEngine::new(
        Arc::new(StaticDense),
        Arc::new(FailingStore),
        EngineConfig::default(),
    );
    engine.reindex(corpus()).await;

    let stats = engine.stats().await;
    assert_eq!(stats.document_count, 3);
    assert!(stats.model_fitted);
    assert_eq!(stats.store_points, None);
    assert_eq!(stats.store_status, None);
}

#[tokio::test]
async fn limit_bounds_every_tier() {
    let engine = healthy_engine();
    engine.reindex(corpus()).await;

    let hybrid = engine.retrieve("management", 1).await.unwrap();
    assert_eq!(hybrid.tier, RetrievalTier::Hybrid);
    assert!(hybrid.results.len() <= 1);

    let engine = SearchEngine::new(
        Arc::new(FailingDense),
        Arc::new(InMemoryStore::new()),
        EngineConfig::default(),
    );
    engine.reindex(corpus()).await;
    let sparse = engine.retrieve("management", 1).await.unwrap();
    assert_eq!(sparse.tier, RetrievalTier::SparseOnly);
    assert!(sparse.results.len() <= 1);
}
