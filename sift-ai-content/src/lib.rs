//! sift-ai-content: document schema and content ingestion for sift
//!
//! This crate defines the [`Document`] unit that the retrieval engine
//! indexes, plus everything needed to produce one from a live content
//! source: HTML-to-text cleanup and a paginating WordPress REST fetcher.
//!
//! Ingestion is strictly an index-time concern. The retrieval engine only
//! consumes the resulting `Document` values; it never talks to the source
//! at query time.

pub mod clean;
pub mod document;
pub mod source;

pub use document::{Document, DocumentMetadata, Taxonomy};
pub use source::{ContentSource, FetchError, WordPressClient};
