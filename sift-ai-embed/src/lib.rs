//! sift-ai-embed: dense vector provider for the sift retrieval engine
//!
//! Defines the [`DenseVectorProvider`] trait the engine retrieves through
//! and an HTTP implementation against an OpenAI-compatible `/embeddings`
//! endpoint. A provider either returns a vector of the configured dimension
//! or an explicit error; there is no placeholder-vector fallback, so broken
//! embeddings can never leak into a scoring pass.

pub mod config;
pub mod error;
pub mod provider;

pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
pub use provider::{DenseVectorProvider, HttpEmbeddingClient};
