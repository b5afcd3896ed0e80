//! Hybrid search: lexical indexing, score blending, retrieval orchestration.

pub mod lexical;
pub mod orchestrator;
pub mod scorer;

pub use lexical::{LexicalModel, SparseVector};
pub use orchestrator::{
    EngineStats, QueryError, ReindexReport, Retrieval, RetrievalTier, ScoredResult, SearchEngine,
};
pub use scorer::{Relevance, blend};
