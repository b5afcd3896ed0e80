//! WordPress REST content source.
//!
//! Pulls published posts and pages through the WordPress REST API, cleans
//! the rendered HTML, and produces [`Document`]s ready for indexing.
//! Pagination walks 100 items per page until the API runs out; author,
//! category and tag data come from the `_embedded` expansion.

use crate::clean::html_to_text;
use crate::document::{Document, DocumentMetadata, Taxonomy};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

const PAGE_SIZE: usize = 100;
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while fetching from a content source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure talking to the content API
    #[error("content request failed: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// The content API answered with a non-success status
    #[error("content API returned status {status} for {url}")]
    Status { status: u16, url: String },
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Ordered feed of cleaned, validated documents.
///
/// This is an ingestion-time collaborator; the retrieval engine never calls
/// it while serving queries.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch every published document from the source.
    async fn fetch_all(&self) -> Result<Vec<Document>>;
}

#[derive(Debug, Default, Deserialize)]
struct Rendered {
    #[serde(default)]
    rendered: String,
}

#[derive(Debug, Deserialize)]
struct WpTerm {
    id: u64,
    name: String,
    slug: String,
    taxonomy: String,
}

#[derive(Debug, Deserialize)]
struct WpAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct WpEmbedded {
    #[serde(default)]
    author: Vec<WpAuthor>,
    #[serde(default, rename = "wp:term")]
    terms: Vec<Vec<WpTerm>>,
}

#[derive(Debug, Deserialize)]
struct WpItem {
    id: u64,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    modified: Option<String>,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: Rendered,
    #[serde(default)]
    content: Rendered,
    #[serde(default)]
    excerpt: Rendered,
    #[serde(rename = "_embedded", default)]
    embedded: Option<WpEmbedded>,
}

/// Client for a WordPress site's REST API (`.../wp-json/wp/v2`).
#[derive(Debug, Clone)]
pub struct WordPressClient {
    client: reqwest::Client,
    api_url: String,
    auth: Option<(String, String)>,
}

impl WordPressClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("sift-content/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_owned(),
            auth: None,
        })
    }

    /// Use application-password basic auth on every request.
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    async fn fetch_kind(&self, kind: &str) -> Result<Vec<WpItem>> {
        let url = format!("{}/{kind}", self.api_url);
        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let mut request = self.client.get(&url).query(&[
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
                ("status", "publish".to_string()),
                ("_embed", "true".to_string()),
            ]);
            if let Some((username, password)) = &self.auth {
                request = request.basic_auth(username, Some(password));
            }

            let response = request.send().await?;
            // WordPress answers 400 once the page number runs past the end.
            if page > 1 && response.status() == reqwest::StatusCode::BAD_REQUEST {
                break;
            }
            if !response.status().is_success() {
                return Err(FetchError::Status {
                    status: response.status().as_u16(),
                    url,
                });
            }

            let batch: Vec<WpItem> = response.json().await?;
            if batch.is_empty() {
                break;
            }
            tracing::info!("fetched {} {kind} from page {page}", batch.len());
            items.extend(batch);
            page += 1;
        }

        Ok(items)
    }
}

#[async_trait]
impl ContentSource for WordPressClient {
    async fn fetch_all(&self) -> Result<Vec<Document>> {
        tracing::info!("starting content fetch from {}", self.api_url);
        let (posts, pages) = tokio::try_join!(self.fetch_kind("posts"), self.fetch_kind("pages"))?;

        let fetched = posts.len() + pages.len();
        let documents: Vec<Document> = posts
            .into_iter()
            .chain(pages)
            .filter_map(document_from_item)
            .collect();

        if documents.len() < fetched {
            tracing::info!(
                "dropped {} items with no usable content",
                fetched - documents.len()
            );
        }
        tracing::info!("processed {} content items", documents.len());
        Ok(documents)
    }
}

/// Turn a raw API item into a clean [`Document`]. Items whose body cleans
/// down to nothing never reach the index.
fn document_from_item(item: WpItem) -> Option<Document> {
    let content = html_to_text(&item.content.rendered);
    if content.is_empty() {
        tracing::debug!("skipping {} {}: no usable content", item.kind, item.id);
        return None;
    }
    let word_count = content.split_whitespace().count();

    let embedded = item.embedded.unwrap_or_default();
    let author = embedded
        .author
        .first()
        .map(|author| author.name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Unknown".to_owned());

    let mut categories = Vec::new();
    let mut tags = Vec::new();
    for term in embedded.terms.into_iter().flatten() {
        let entry = Taxonomy {
            id: term.id,
            name: term.name,
            slug: term.slug,
        };
        match term.taxonomy.as_str() {
            "category" => categories.push(entry),
            "post_tag" => tags.push(entry),
            _ => {}
        }
    }

    Some(Document {
        id: item.id.to_string(),
        title: html_to_text(&item.title.rendered),
        url: item.link,
        excerpt: html_to_text(&item.excerpt.rendered),
        content,
        word_count,
        metadata: DocumentMetadata {
            kind: item.kind,
            author,
            categories,
            tags,
            published: parse_wp_date(item.date.as_deref()),
            modified: parse_wp_date(item.modified.as_deref()),
        },
    })
}

/// WordPress emits site-local timestamps without an offset; accept those and
/// full RFC 3339 alike. Unparseable dates are dropped, not fatal.
fn parse_wp_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
