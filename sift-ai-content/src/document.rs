//! The document schema shared by ingestion and retrieval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A category or tag attached to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

/// Metadata carried alongside the indexed fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Content kind as reported by the source ("post", "page", ...)
    pub kind: String,
    pub author: String,
    pub categories: Vec<Taxonomy>,
    pub tags: Vec<Taxonomy>,
    pub published: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

/// A unit of indexed content.
///
/// `id` uniquely identifies a document within one corpus generation.
/// `content` is non-empty for anything that reaches the index; the fetcher
/// drops items that clean down to nothing. Documents are immutable once
/// indexed and replaced wholesale on reindex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub url: String,
    pub excerpt: String,
    /// Full cleaned text of the document body
    pub content: String,
    pub word_count: usize,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl Document {
    /// The text that gets embedded and fitted: title and body together.
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}
