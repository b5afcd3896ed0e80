//! sift-ai-engine: hybrid retrieval and scoring over ingested documents
//!
//! This crate turns a natural-language query into a dense vector and a
//! sparse TF-IDF vector, retrieves against an indexed corpus, and blends
//! both signals into one ranked, relevance-labelled result list. When a
//! signal is unavailable the engine degrades through three strategy tiers
//! instead of failing:
//!
//! ```text
//! dense+sparse hybrid ──▶ sparse-only lexical ──▶ substring match
//!   (dense provider +       (fitted lexical         (always available)
//!    corpus store)            model)
//! ```
//!
//! ## Key Modules
//!
//! - **[`search`]**: lexical indexing, score blending, and the retrieval
//!   orchestrator
//! - **[`storage`]**: corpus store abstraction with in-memory and HTTP
//!   vector-database backends
//! - **[`config`]**: engine tuning knobs and service configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sift_ai_engine::config::EngineConfig;
//! use sift_ai_engine::search::SearchEngine;
//! use sift_ai_engine::storage::memory::InMemoryStore;
//! use sift_ai_embed::{EmbedConfig, HttpEmbeddingClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let dense = Arc::new(HttpEmbeddingClient::new(EmbedConfig::default())?);
//! let store = Arc::new(InMemoryStore::new());
//! let engine = SearchEngine::new(dense, store, EngineConfig::default());
//!
//! let retrieval = engine.retrieve("solar panel maintenance", 10).await?;
//! for result in retrieval.results {
//!     println!("{:.3} [{}] {}", result.score, result.relevance.as_str(), result.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod search;
pub mod storage;
