//! Engine tuning and service configuration.
//!
//! [`EngineConfig`] carries the retrieval knobs. [`SiftConfig`] is the
//! whole-service file the CLI loads from toml; every section has working
//! defaults so a missing file still yields a runnable local setup.

use serde::Deserialize;
use std::path::Path;

/// Tuning knobs for the retrieval engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Share of the blended score taken from the dense signal; the sparse
    /// signal gets the remainder
    pub dense_weight: f32,
    /// Vocabulary cap for the lexical model
    pub max_vocab_terms: usize,
    /// Over-fetch factor for hybrid candidates (`limit * multiplier`)
    pub candidate_multiplier: usize,
    /// Upper bound a caller may request for `limit`
    pub max_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dense_weight: 0.7,
            max_vocab_terms: 10_000,
            candidate_multiplier: 2,
            max_limit: 50,
        }
    }
}

/// Connection settings for the embedding endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080/v1".to_owned(),
            api_key: None,
            model: "text-embedding-ada-002".to_owned(),
            dimension: 384,
        }
    }
}

/// Connection settings for the vector store.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_owned(),
            api_key: None,
            collection: "site_content".to_owned(),
        }
    }
}

/// Connection settings for the content source.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SourceSection {
    pub api_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Whole-service configuration, usually loaded from `sift.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    pub engine: EngineConfig,
    pub embedding: EmbeddingSection,
    pub store: StoreSection,
    pub source: SourceSection,
}

impl SiftConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|error| anyhow::anyhow!("reading {}: {error}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|error| anyhow::anyhow!("parsing {}: {error}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_defaults() {
        let config = EngineConfig::default();
        assert!((config.dense_weight - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.max_vocab_terms, 10_000);
        assert_eq!(config.candidate_multiplier, 2);
        assert_eq!(config.max_limit, 50);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let raw = r#"
            [engine]
            dense_weight = 0.5

            [source]
            api_url = "https://example.com/wp-json/wp/v2"
        "#;
        let config: SiftConfig = toml::from_str(raw).unwrap();
        assert!((config.engine.dense_weight - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.engine.max_limit, 50);
        assert_eq!(config.store.collection, "site_content");
        assert_eq!(config.source.api_url, "https://example.com/wp-json/wp/v2");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sift.toml");
        std::fs::write(&path, "[store]\ncollection = \"docs\"\n").unwrap();

        let config = SiftConfig::load(&path).unwrap();
        assert_eq!(config.store.collection, "docs");

        assert!(SiftConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
