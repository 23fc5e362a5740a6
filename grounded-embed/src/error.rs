//! Error types for the embedding client

/// Result type for embedding operations.
///
/// Convenience alias using [`EmbedError`] as the error type, used throughout
/// the crate for operations that can fail.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Error type for all embedding operations.
///
/// Configuration problems are detected before any request is issued. Request
/// errors come straight from the transport and are never retried here; a
/// failed batch aborts the whole embedding pass.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Error when the embedding configuration is invalid
    #[error("Invalid embedding configuration: {message}")]
    InvalidConfig { message: String },

    /// Error from the remote embedding service or its transport
    #[error("Embedding service request failed: {source}")]
    Request {
        #[from]
        source: reqwest::Error,
    },

    /// Error when the remote service answered with an unusable body
    #[error("Unexpected embedding service response: {message}")]
    UnexpectedResponse { message: String },

    /// Generic errors from other libraries
    #[error("External error: {source}")]
    External {
        #[from]
        source: anyhow::Error,
    },
}

impl EmbedError {
    /// Create an invalid configuration error with a custom message.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an unexpected-response error with a custom message.
    pub fn unexpected_response<S: Into<String>>(message: S) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }
}
