//! Retrieval orchestration across three degrading strategy tiers.
//!
//! [`SearchEngine`] owns the live corpus generation (documents + lexical
//! model) and holds references to the dense-provider and corpus-store
//! collaborators. Every `retrieve` call re-resolves which tier can serve
//! it from the collaborators' current health:
//!
//! ```text
//! dense+sparse hybrid ─(embed/store failure)─▶ sparse-only ─(no model)─▶ substring
//! ```
//!
//! Collaborator failures cost result quality, never availability: they are
//! logged and the call degrades one tier. Only malformed input (blank
//! query, limit out of bounds) is an error, rejected before any retrieval
//! work starts.

use crate::config::EngineConfig;
use crate::search::lexical::LexicalModel;
use crate::search::scorer::{Relevance, blend};
use crate::storage::{CorpusStore, DocumentPoint, ScoredPoint};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use sift_ai_content::Document;
use sift_ai_embed::DenseVectorProvider;
use std::sync::{Arc, RwLock};

/// Documents embedded per request during reindex.
const EMBED_CHUNK: usize = 16;
/// Embedding requests in flight at once during reindex.
const EMBED_CONCURRENCY: usize = 4;

/// Strategy tier that served a retrieval call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalTier {
    /// Dense nearest-neighbor candidates re-scored with the sparse signal
    Hybrid,
    /// Lexical similarity against the in-memory corpus only
    SparseOnly,
    /// Case-insensitive substring matching over raw document fields
    Substring,
}

impl RetrievalTier {
    /// Whether this tier runs below full hybrid quality.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Hybrid)
    }
}

/// Input rejected before any retrieval work starts.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("limit must be between 1 and {max}, got {limit}")]
    LimitOutOfRange { limit: usize, max: usize },
}

/// One ranked result.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredResult {
    pub id: String,
    pub title: String,
    pub url: String,
    pub excerpt: String,
    pub score: f32,
    pub relevance: Relevance,
}

/// A ranked result list plus the tier that produced it, so callers can tell
/// degraded service from full hybrid service.
#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    pub tier: RetrievalTier,
    pub generation: u64,
    pub results: Vec<ScoredResult>,
}

/// Outcome of a reindex pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReindexReport {
    pub documents: usize,
    pub generation: u64,
    /// False when embedding or publishing failed. The lexical state still
    /// tracks the new corpus; the dense store lags until the next
    /// successful pass.
    pub dense_published: bool,
}

/// Engine-level statistics.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub document_count: usize,
    pub model_fitted: bool,
    pub generation: u64,
    pub store_points: Option<usize>,
    pub store_status: Option<String>,
}

/// One fully-fitted corpus snapshot. Swapped wholesale on reindex so
/// readers observe either the old generation or the new one, never a mix.
struct CorpusState {
    generation: u64,
    documents: Arc<Vec<Document>>,
    model: Option<Arc<LexicalModel>>,
}

impl CorpusState {
    fn empty() -> Self {
        Self {
            generation: 0,
            documents: Arc::new(Vec::new()),
            model: None,
        }
    }
}

/// The retrieval engine's entry point.
pub struct SearchEngine {
    dense: Arc<dyn DenseVectorProvider>,
    store: Arc<dyn CorpusStore>,
    config: EngineConfig,
    corpus: RwLock<Arc<CorpusState>>,
}

impl SearchEngine {
    pub fn new(
        dense: Arc<dyn DenseVectorProvider>,
        store: Arc<dyn CorpusStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            dense,
            store,
            config,
            corpus: RwLock::new(Arc::new(CorpusState::empty())),
        }
    }

    /// Clone out the current generation; the lock is held only for the
    /// pointer copy.
    fn snapshot(&self) -> Arc<CorpusState> {
        self.corpus.read().expect("corpus lock poisoned").clone()
    }

    /// Retrieve up to `limit` ranked results for `query`.
    ///
    /// An empty corpus yields an empty list, not an error; collaborator
    /// outages degrade the serving tier without surfacing.
    pub async fn retrieve(&self, query: &str, limit: usize) -> Result<Retrieval, QueryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        if limit == 0 || limit > self.config.max_limit {
            return Err(QueryError::LimitOutOfRange {
                limit,
                max: self.config.max_limit,
            });
        }

        let state = self.snapshot();

        match self.dense.embed(query).await {
            Ok(query_vector) => {
                let candidates = limit * self.config.candidate_multiplier.max(1);
                match self.store.nearest_neighbors(&query_vector, candidates).await {
                    Ok(hits) => return Ok(self.rank_hybrid(&state, query, hits, limit)),
                    Err(error) => {
                        tracing::warn!(%error, "corpus store unavailable, falling back to lexical retrieval");
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, "dense embedding unavailable, falling back to lexical retrieval");
            }
        }

        if let Some(model) = &state.model {
            return Ok(rank_sparse(&state, model, query, limit));
        }
        Ok(rank_substring(&state, query, limit))
    }

    /// Replace the corpus generation: fit a fresh lexical model, republish
    /// dense vectors, then swap the in-memory snapshot.
    ///
    /// A failed embed or publish still installs the lexical state so the
    /// sparse and substring tiers track the new corpus; the report records
    /// that the dense store lags.
    pub async fn reindex(&self, documents: Vec<Document>) -> ReindexReport {
        let model = LexicalModel::fit(
            documents
                .iter()
                .map(|document| (document.id.as_str(), document.combined_text())),
            self.config.max_vocab_terms,
        );
        tracing::info!(
            documents = documents.len(),
            fitted = model.is_some(),
            "fitting new corpus generation"
        );

        let dense_published = self.publish_dense(&documents).await;

        let mut corpus = self.corpus.write().expect("corpus lock poisoned");
        let generation = corpus.generation + 1;
        *corpus = Arc::new(CorpusState {
            generation,
            documents: Arc::new(documents),
            model: model.map(Arc::new),
        });
        let documents = corpus.documents.len();
        drop(corpus);

        tracing::info!(generation, documents, dense_published, "corpus generation live");
        ReindexReport {
            documents,
            generation,
            dense_published,
        }
    }

    /// Corpus and collaborator statistics; store figures are best-effort.
    pub async fn stats(&self) -> EngineStats {
        let state = self.snapshot();
        let (store_points, store_status) = match self.store.stats().await {
            Ok(stats) => (Some(stats.points), Some(stats.status)),
            Err(error) => {
                tracing::warn!(%error, "corpus store stats unavailable");
                (None, None)
            }
        };
        EngineStats {
            document_count: state.documents.len(),
            model_fitted: state.model.is_some(),
            generation: state.generation,
            store_points,
            store_status,
        }
    }

    /// Embed every document and republish the store wholesale. Returns
    /// whether the dense side now matches the new corpus.
    async fn publish_dense(&self, documents: &[Document]) -> bool {
        let texts: Vec<String> = documents.iter().map(Document::combined_text).collect();

        let chunk_futures: Vec<_> = texts
            .chunks(EMBED_CHUNK)
            .map(|chunk| {
                let dense = Arc::clone(&self.dense);
                let chunk = chunk.to_vec();
                async move { dense.embed_batch(&chunk).await }
            })
            .collect();
        let chunk_results: Vec<_> = stream::iter(chunk_futures)
            .buffered(EMBED_CONCURRENCY)
            .collect()
            .await;

        let mut vectors = Vec::with_capacity(texts.len());
        for result in chunk_results {
            match result {
                Ok(batch) => vectors.extend(batch),
                Err(error) => {
                    tracing::warn!(%error, "dense embedding failed during reindex, dense tier will lag");
                    return false;
                }
            }
        }

        let points: Vec<DocumentPoint> = documents
            .iter()
            .cloned()
            .zip(vectors)
            .map(|(document, vector)| DocumentPoint { document, vector })
            .collect();

        if let Err(error) = self.store.reset().await {
            tracing::warn!(%error, "corpus store reset failed, dense tier will lag");
            return false;
        }
        if let Err(error) = self.store.upsert(points).await {
            tracing::warn!(%error, "publishing to corpus store failed, dense tier will lag");
            return false;
        }
        true
    }

    /// Re-score dense candidates with the sparse signal and blend.
    fn rank_hybrid(
        &self,
        state: &CorpusState,
        query: &str,
        hits: Vec<ScoredPoint>,
        limit: usize,
    ) -> Retrieval {
        // An unfitted model or a query outside the vocabulary means the
        // sparse signal is absent, not zero: the dense score passes through
        // unscaled.
        let query_sparse = state
            .model
            .as_ref()
            .map(|model| model.vectorize(query))
            .filter(|vector| !vector.is_empty());

        let mut results: Vec<ScoredResult> = hits
            .iter()
            .map(|hit| {
                let sparse = query_sparse.as_ref().map(|query_vector| {
                    state
                        .model
                        .as_ref()
                        .and_then(|model| model.document_vector(&hit.document.id))
                        .map(|doc_vector| query_vector.cosine(doc_vector))
                        .unwrap_or(0.0)
                });
                let score = blend(Some(hit.score), sparse, self.config.dense_weight)
                    .unwrap_or(hit.score);
                to_result(&hit.document, score)
            })
            .collect();

        sort_and_truncate(&mut results, limit);
        Retrieval {
            tier: RetrievalTier::Hybrid,
            generation: state.generation,
            results,
        }
    }
}

/// Lexical similarity against every indexed document; only strictly
/// positive scores survive.
fn rank_sparse(
    state: &CorpusState,
    model: &LexicalModel,
    query: &str,
    limit: usize,
) -> Retrieval {
    let query_vector = model.vectorize(query);
    let mut results: Vec<ScoredResult> = state
        .documents
        .iter()
        .filter_map(|document| {
            let doc_vector = model.document_vector(&document.id)?;
            let score = query_vector.cosine(doc_vector);
            (score > 0.0).then(|| to_result(document, score))
        })
        .collect();

    sort_and_truncate(&mut results, limit);
    Retrieval {
        tier: RetrievalTier::SparseOnly,
        generation: state.generation,
        results,
    }
}

/// Terminal fallback: weighted case-insensitive substring matching over
/// title, excerpt and content.
fn rank_substring(state: &CorpusState, query: &str, limit: usize) -> Retrieval {
    let needle = query.to_lowercase();
    let matched: Vec<(f32, &Document)> = state
        .documents
        .iter()
        .filter_map(|document| {
            let mut score = 0.0f32;
            if document.title.to_lowercase().contains(&needle) {
                score += 3.0;
            }
            if document.excerpt.to_lowercase().contains(&needle) {
                score += 2.0;
            }
            if document.content.to_lowercase().contains(&needle) {
                score += 1.0;
            }
            (score > 0.0).then_some((score, document))
        })
        .collect();

    // Field weights live on an integer scale; normalizing by the best match
    // keeps the shared relevance thresholds meaningful.
    let top = matched.iter().map(|(score, _)| *score).fold(0.0f32, f32::max);
    let mut results: Vec<ScoredResult> = matched
        .into_iter()
        .map(|(score, document)| to_result(document, if top > 0.0 { score / top } else { 0.0 }))
        .collect();

    sort_and_truncate(&mut results, limit);
    Retrieval {
        tier: RetrievalTier::Substring,
        generation: state.generation,
        results,
    }
}

fn to_result(document: &Document, score: f32) -> ScoredResult {
    ScoredResult {
        id: document.id.clone(),
        title: document.title.clone(),
        url: document.url.clone(),
        excerpt: document.excerpt.clone(),
        score,
        relevance: Relevance::from_score(score),
    }
}

/// Stable descending sort: ties keep candidate/corpus order.
fn sort_and_truncate(results: &mut Vec<ScoredResult>, limit: usize) {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
}
