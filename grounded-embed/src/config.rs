//! Configuration for the remote embedding service

use crate::error::{EmbedError, Result};

/// Configuration for a remote embedding endpoint.
///
/// The endpoint is expected to expose an OpenAI-style `/embeddings` route
/// accepting batched input. Texts are grouped into requests of at most
/// `batch_size` items.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedConfig {
    /// Base URL of the embedding service, e.g. `http://127.0.0.1:8000/v1`.
    pub endpoint: String,
    /// Model identifier sent with every request. Vectors for the same model
    /// identifier always have identical dimensionality, so this must match
    /// whatever model built any index the embeddings are compared against.
    pub model: String,
    /// Maximum number of texts per remote request.
    pub batch_size: usize,
    /// Optional bearer token for the service.
    pub api_key: Option<String>,
}

impl EmbedConfig {
    /// Create a configuration with the default batch size and no API key.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            batch_size: 32,
            api_key: None,
        }
    }

    /// Set the maximum number of texts per remote request (builder style)
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    /// Set the bearer token sent with every request (builder style)
    pub fn with_api_key<S: Into<String>>(self, api_key: S) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..self
        }
    }

    /// Validate the configuration before any request is issued.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(EmbedError::invalid_config("endpoint must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(EmbedError::invalid_config("model must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(EmbedError::invalid_config("batch_size must be positive"));
        }
        Ok(())
    }

    /// Full URL of the embeddings route.
    pub fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.endpoint.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = EmbedConfig::new("http://127.0.0.1:8000/v1", "bge-base-en-v1.5");

        assert_eq!(config.endpoint, "http://127.0.0.1:8000/v1");
        assert_eq!(config.model, "bge-base-en-v1.5");
        assert_eq!(config.batch_size, 32);
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder_methods() {
        let config = EmbedConfig::new("http://127.0.0.1:8000/v1", "bge-base-en-v1.5")
            .with_batch_size(8)
            .with_api_key("secret");

        assert_eq!(config.batch_size, 8);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_validation_rejects_blank_fields() {
        let no_endpoint = EmbedConfig::new("", "model");
        assert!(matches!(
            no_endpoint.validate(),
            Err(EmbedError::InvalidConfig { .. })
        ));

        let no_model = EmbedConfig::new("http://127.0.0.1:8000/v1", "  ");
        assert!(matches!(
            no_model.validate(),
            Err(EmbedError::InvalidConfig { .. })
        ));

        let zero_batch =
            EmbedConfig::new("http://127.0.0.1:8000/v1", "model").with_batch_size(0);
        assert!(matches!(
            zero_batch.validate(),
            Err(EmbedError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_embeddings_url_strips_trailing_slash() {
        let config = EmbedConfig::new("http://127.0.0.1:8000/v1/", "model");
        assert_eq!(config.embeddings_url(), "http://127.0.0.1:8000/v1/embeddings");
    }
}
