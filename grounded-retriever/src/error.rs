//! Error types for the retrieval pipeline

use grounded_context::SplitError;
use grounded_embed::EmbedError;
use std::path::PathBuf;

/// Result type for retrieval operations.
///
/// Convenience alias using [`RetrieverError`] as the error type, used
/// throughout the crate for operations that can fail.
pub type Result<T> = std::result::Result<T, RetrieverError>;

/// Error type for all retrieval operations.
///
/// Configuration problems fail fast before any I/O. Remote-service failures
/// are never retried. Loader failures for individual documents are recovered
/// locally (skip and warn) and only surface here when a whole directory is
/// unreadable.
#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    /// Error when the retriever configuration is invalid
    #[error("Invalid retriever configuration: {message}")]
    Config { message: String },

    /// Error when a document directory cannot be read at all
    #[error("Document loader failed: {message}")]
    Loader { message: String },

    /// Error from a remote embedding or completion call
    #[error("Remote service call failed: {message}")]
    RemoteService { message: String },

    /// Error when the index artifacts are missing and no documents were
    /// given to rebuild them
    #[error("No index artifacts found under {dir} and no documents provided to build them")]
    ArtifactsNotFound { dir: PathBuf },

    /// Error when exactly one of the two companion artifacts exists
    #[error("Inconsistent index artifacts: {present} exists but {missing} is missing")]
    InconsistentArtifacts { present: PathBuf, missing: PathBuf },

    /// Error when a persisted artifact cannot be deserialized
    #[error("Corrupt index artifact {path}: {message}")]
    CorruptArtifact { path: PathBuf, message: String },

    /// Error when vector dimensionality differs from the index
    #[error("Embedding dimensionality mismatch: index holds {expected}, got {actual}")]
    DimensionalityMismatch { expected: usize, actual: usize },

    /// Errors from filesystem operations
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Errors serializing or deserializing the metadata artifact
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl RetrieverError {
    /// Create an invalid configuration error with a custom message.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a loader error with a custom message.
    pub fn loader<S: Into<String>>(message: S) -> Self {
        Self::Loader {
            message: message.into(),
        }
    }

    /// Create a remote-service error with a custom message.
    pub fn remote_service<S: Into<String>>(message: S) -> Self {
        Self::RemoteService {
            message: message.into(),
        }
    }

    /// Create a corrupt-artifact error for a path.
    pub fn corrupt_artifact<S: Into<String>>(path: PathBuf, message: S) -> Self {
        Self::CorruptArtifact {
            path,
            message: message.into(),
        }
    }
}

// Embedding failures cross this boundary as labeled remote-service errors;
// callers never see a raw transport error.
impl From<EmbedError> for RetrieverError {
    fn from(source: EmbedError) -> Self {
        match source {
            EmbedError::InvalidConfig { message } => RetrieverError::Config { message },
            other => RetrieverError::remote_service(other.to_string()),
        }
    }
}

impl From<SplitError> for RetrieverError {
    fn from(source: SplitError) -> Self {
        RetrieverError::config(source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_errors_become_remote_service() {
        let err: RetrieverError =
            EmbedError::unexpected_response("bad body").into();
        assert!(matches!(err, RetrieverError::RemoteService { .. }));

        let config_err: RetrieverError = EmbedError::invalid_config("no model").into();
        assert!(matches!(config_err, RetrieverError::Config { .. }));
    }

    #[test]
    fn test_split_errors_become_config() {
        let err: RetrieverError = grounded_context::TextSplitter::new(0, 0).unwrap_err().into();
        assert!(matches!(err, RetrieverError::Config { .. }));
    }
}
