//! Configuration for the HTTP embedding client

use std::time::Duration;

/// Connection and model settings for an OpenAI-compatible embeddings
/// endpoint.
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    /// Base URL of the API, e.g. `https://api.cerebras.ai/v1`
    pub api_base: String,
    /// Bearer token; requests go out unauthenticated when `None`
    pub api_key: Option<String>,
    /// Model identifier sent with every request
    pub model: String,
    /// Dimensionality every returned vector must match
    pub dimension: usize,
    /// Per-request timeout; a slow endpoint is treated as failed, not hung
    pub timeout: Duration,
    /// Maximum texts per batch request
    pub batch_size: usize,
}

impl EmbedConfig {
    pub fn new(
        api_base: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_owned(),
            api_key: None,
            model: model.into(),
            dimension,
            timeout: Duration::from_secs(30),
            batch_size: 32,
        }
    }

    /// Set the bearer token (builder style)
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the per-request timeout (builder style)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the batch size (builder style)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080/v1", "text-embedding-ada-002", 384)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EmbedConfig::default();
        assert_eq!(config.dimension, 384);
        assert_eq!(config.batch_size, 32);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn builder_methods() {
        let config = EmbedConfig::new("https://api.example.com/v1/", "small-embed", 128)
            .with_api_key("secret")
            .with_timeout(Duration::from_secs(5))
            .with_batch_size(0);

        assert_eq!(config.api_base, "https://api.example.com/v1");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        // batch size never drops below one
        assert_eq!(config.batch_size, 1);
    }
}
