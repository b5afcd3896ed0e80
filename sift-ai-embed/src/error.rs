//! Error types for dense embedding

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Failure modes of a dense vector provider.
///
/// Every variant means the dense signal is unavailable for this call. The
/// retrieval engine reacts by degrading to a lexical tier rather than
/// surfacing these to its caller, and a failed call never yields a
/// placeholder vector.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Transport-level failure talking to the embedding endpoint
    #[error("embedding request failed: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status
    #[error("embedding API returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// The endpoint answered but carried no usable vector
    #[error("embedding response carried no vector")]
    EmptyResponse,

    /// The vector did not match the configured dimensionality
    #[error("expected embedding dimension {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The vector contained NaN or infinite components
    #[error("embedding contained non-finite values")]
    NonFinite,

    /// Generic errors from other libraries
    #[error("external error: {source}")]
    External {
        #[from]
        source: anyhow::Error,
    },
}

impl EmbedError {
    /// Create an API error from a status code and response body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}
