//! Configuration for the retrieval pipeline

use crate::error::{Result, RetrieverError};
use grounded_embed::EmbedConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_persist_dir() -> PathBuf {
    PathBuf::from("vector_store")
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("data/staged")
}

fn default_embedded_dir() -> PathBuf {
    PathBuf::from("data/embedded")
}

fn default_transcript_dir() -> PathBuf {
    PathBuf::from("transcripts")
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    5
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8000/v1".to_string()
}

fn default_embedding_model() -> String {
    "bge-base-en-v1.5".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_completion_model() -> String {
    "llama-3.1-8b-instruct".to_string()
}

/// Settings for the remote embedding capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            api_key: None,
        }
    }
}

impl EmbeddingSettings {
    /// Convert into the embed crate's client configuration.
    pub fn to_embed_config(&self) -> EmbedConfig {
        let config = EmbedConfig::new(&self.endpoint, &self.model).with_batch_size(self.batch_size);
        match &self.api_key {
            Some(key) => config.with_api_key(key),
            None => config,
        }
    }
}

/// Settings for the remote completion capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_completion_model(),
            api_key: None,
        }
    }
}

/// Configuration for the whole retrieval pipeline, deserializable from TOML.
///
/// All fields have defaults, so an empty file (or no file at all) yields a
/// usable local configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieverConfig {
    /// Directory holding the two durable index artifacts.
    #[serde(default = "default_persist_dir")]
    pub persist_dir: PathBuf,
    /// Directory where uploaded documents wait to be indexed.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
    /// Directory where documents are moved after indexing.
    #[serde(default = "default_embedded_dir")]
    pub embedded_dir: PathBuf,
    /// Directory for session transcripts.
    #[serde(default = "default_transcript_dir")]
    pub transcript_dir: PathBuf,
    /// Maximum chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in bytes.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Default number of results retrieved per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub completion: CompletionSettings,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            persist_dir: default_persist_dir(),
            staging_dir: default_staging_dir(),
            embedded_dir: default_embedded_dir(),
            transcript_dir: default_transcript_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            embedding: EmbeddingSettings::default(),
            completion: CompletionSettings::default(),
        }
    }
}

impl RetrieverConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| RetrieverError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            RetrieverError::config(format!("failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Set the persist directory (builder style)
    pub fn with_persist_dir<P: Into<PathBuf>>(self, persist_dir: P) -> Self {
        Self {
            persist_dir: persist_dir.into(),
            ..self
        }
    }

    /// Set the staging directory (builder style)
    pub fn with_staging_dir<P: Into<PathBuf>>(self, staging_dir: P) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            ..self
        }
    }

    /// Set the embedded-documents directory (builder style)
    pub fn with_embedded_dir<P: Into<PathBuf>>(self, embedded_dir: P) -> Self {
        Self {
            embedded_dir: embedded_dir.into(),
            ..self
        }
    }

    /// Set the transcript directory (builder style)
    pub fn with_transcript_dir<P: Into<PathBuf>>(self, transcript_dir: P) -> Self {
        Self {
            transcript_dir: transcript_dir.into(),
            ..self
        }
    }

    /// Set chunking parameters (builder style)
    pub fn with_chunking(self, chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..self
        }
    }

    /// Validate the configuration, failing fast before any I/O.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RetrieverError::config("chunk_size must be positive"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RetrieverError::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RetrieverError::config("top_k must be positive"));
        }
        if self.embedding.endpoint.trim().is_empty() || self.embedding.model.trim().is_empty() {
            return Err(RetrieverError::config(
                "embedding endpoint and model must not be empty",
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(RetrieverError::config("embedding batch_size must be positive"));
        }
        if self.completion.endpoint.trim().is_empty() || self.completion.model.trim().is_empty() {
            return Err(RetrieverError::config(
                "completion endpoint and model must not be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RetrieverConfig::default();

        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.persist_dir, PathBuf::from("vector_store"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = RetrieverConfig::from_toml_str("").unwrap();
        assert_eq!(config, RetrieverConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = RetrieverConfig::from_toml_str(
            r#"
            persist_dir = "store"
            chunk_size = 500
            chunk_overlap = 50

            [embedding]
            model = "custom-embedder"
            batch_size = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.persist_dir, PathBuf::from("store"));
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.embedding.model, "custom-embedder");
        assert_eq!(config.embedding.batch_size, 8);
        // Untouched sections keep their defaults.
        assert_eq!(config.completion, CompletionSettings::default());
        assert_eq!(config.top_k, 5);
    }

    #[test]
    fn test_invalid_sizes_rejected() {
        assert!(matches!(
            RetrieverConfig::from_toml_str("chunk_size = 0"),
            Err(RetrieverError::Config { .. })
        ));
        assert!(matches!(
            RetrieverConfig::from_toml_str("chunk_size = 100\nchunk_overlap = 100"),
            Err(RetrieverError::Config { .. })
        ));
        assert!(matches!(
            RetrieverConfig::from_toml_str("top_k = 0"),
            Err(RetrieverError::Config { .. })
        ));
    }

    #[test]
    fn test_blank_model_rejected() {
        let result = RetrieverConfig::from_toml_str(
            r#"
            [embedding]
            model = ""
            "#,
        );
        assert!(matches!(result, Err(RetrieverError::Config { .. })));
    }

    #[test]
    fn test_embed_config_conversion() {
        let settings = EmbeddingSettings {
            endpoint: "http://localhost:9000/v1".to_string(),
            model: "test-model".to_string(),
            batch_size: 4,
            api_key: Some("key".to_string()),
        };

        let embed_config = settings.to_embed_config();
        assert_eq!(embed_config.endpoint, "http://localhost:9000/v1");
        assert_eq!(embed_config.model, "test-model");
        assert_eq!(embed_config.batch_size, 4);
        assert_eq!(embed_config.api_key.as_deref(), Some("key"));
    }
}
