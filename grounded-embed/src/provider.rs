//! Embedding provider trait and the remote HTTP implementation

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// The generated embeddings, one per input text, in input order
    pub embeddings: Vec<Vec<f32>>,
    /// The dimension of each embedding vector
    pub dimension: usize,
}

impl EmbeddingResult {
    /// Create a new embedding result from a vector of embeddings.
    ///
    /// The dimension is inferred from the first embedding vector; an empty
    /// result has dimension 0.
    pub fn new(embeddings: Vec<Vec<f32>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    /// Returns the number of embedding vectors in this result.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Returns `true` if this result contains no embedding vectors.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Trait for embedding providers that can generate embeddings from text.
///
/// Implementations must be order-preserving: the i-th output vector embeds
/// the i-th input text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text, used for query embedding
    /// at search time.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch processing).
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult>;

    /// Get the model identifier of this provider.
    fn model_id(&self) -> &str;
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

/// Reorder a response into input order using the per-item `index` field and
/// reject incomplete or ragged responses. The service reports one embedding
/// per input; anything else is unusable and must fail loudly rather than be
/// padded or truncated.
fn collect_batch(response: EmbeddingsResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    if response.data.len() != expected {
        return Err(EmbedError::unexpected_response(format!(
            "expected {} embeddings, service returned {}",
            expected,
            response.data.len()
        )));
    }

    let mut ordered: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in response.data {
        let slot = ordered.get_mut(item.index).ok_or_else(|| {
            EmbedError::unexpected_response(format!(
                "embedding index {} out of range for batch of {}",
                item.index, expected
            ))
        })?;
        if slot.replace(item.embedding).is_some() {
            return Err(EmbedError::unexpected_response(format!(
                "duplicate embedding index {}",
                item.index
            )));
        }
    }

    let embeddings: Vec<Vec<f32>> = ordered
        .into_iter()
        .map(|slot| {
            slot.ok_or_else(|| EmbedError::unexpected_response("missing embedding index in response"))
        })
        .collect::<Result<_>>()?;

    if let Some(first) = embeddings.first() {
        let dimension = first.len();
        if dimension == 0 {
            return Err(EmbedError::unexpected_response("service returned an empty embedding"));
        }
        for (i, embedding) in embeddings.iter().enumerate() {
            if embedding.len() != dimension {
                return Err(EmbedError::unexpected_response(format!(
                    "ragged embedding dimensions: item 0 has {}, item {} has {}",
                    dimension,
                    i,
                    embedding.len()
                )));
            }
        }
    }

    Ok(embeddings)
}

/// Remote embedding provider speaking the OpenAI-style embeddings protocol.
///
/// Texts are grouped into requests of at most `batch_size` items, one POST
/// per batch. A failed batch aborts the whole embedding pass; there is no
/// per-batch retry.
#[derive(Debug, Clone)]
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    config: EmbedConfig,
}

impl HttpEmbeddingProvider {
    /// Create a provider for the given endpoint, failing fast on invalid
    /// configuration.
    pub fn new(config: EmbedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: reqwest::Client::new(),
            config,
        })
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingsRequest {
            model: &self.config.model,
            input: batch,
        };

        let mut builder = self.client.post(self.config.embeddings_url()).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?.error_for_status()?;
        let body: EmbeddingsResponse = response.json().await?;
        collect_batch(body, batch.len())
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let texts = vec![text.to_string()];
        let result = self.embed_texts(&texts).await?;
        result
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::unexpected_response("no embedding generated for text"))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        if texts.is_empty() {
            return Ok(EmbeddingResult::new(vec![]));
        }

        tracing::debug!(
            "Generating embeddings for {} texts via {}",
            texts.len(),
            self.config.model
        );

        let mut all_embeddings: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size) {
            let embeddings = self.embed_batch(batch).await?;
            if let (Some(seen), Some(new)) = (all_embeddings.first(), embeddings.first()) {
                if seen.len() != new.len() {
                    return Err(EmbedError::unexpected_response(format!(
                        "embedding dimension changed across batches: {} then {}",
                        seen.len(),
                        new.len()
                    )));
                }
            }
            all_embeddings.extend(embeddings);
        }

        tracing::debug!("Generated {} embeddings", all_embeddings.len());
        Ok(EmbeddingResult::new(all_embeddings))
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(items: Vec<(usize, Vec<f32>)>) -> EmbeddingsResponse {
        EmbeddingsResponse {
            data: items
                .into_iter()
                .map(|(index, embedding)| EmbeddingItem { index, embedding })
                .collect(),
        }
    }

    #[test]
    fn test_embedding_result() {
        let result = EmbeddingResult::new(vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]]);

        assert_eq!(result.len(), 2);
        assert_eq!(result.dimension, 3);
        assert!(!result.is_empty());

        let empty = EmbeddingResult::new(vec![]);
        assert_eq!(empty.dimension, 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_collect_batch_restores_input_order() {
        let body = response(vec![
            (2, vec![3.0, 3.0]),
            (0, vec![1.0, 1.0]),
            (1, vec![2.0, 2.0]),
        ]);

        let embeddings = collect_batch(body, 3).unwrap();
        assert_eq!(
            embeddings,
            vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]]
        );
    }

    #[test]
    fn test_collect_batch_rejects_wrong_count() {
        let body = response(vec![(0, vec![1.0])]);
        assert!(matches!(
            collect_batch(body, 2),
            Err(EmbedError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn test_collect_batch_rejects_ragged_dimensions() {
        let body = response(vec![(0, vec![1.0, 2.0]), (1, vec![1.0, 2.0, 3.0])]);
        assert!(matches!(
            collect_batch(body, 2),
            Err(EmbedError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn test_collect_batch_rejects_duplicate_index() {
        let body = response(vec![(0, vec![1.0]), (0, vec![2.0])]);
        assert!(matches!(
            collect_batch(body, 2),
            Err(EmbedError::UnexpectedResponse { .. })
        ));
    }

    #[test]
    fn test_provider_rejects_invalid_config() {
        let config = EmbedConfig::new("", "model");
        assert!(matches!(
            HttpEmbeddingProvider::new(config),
            Err(EmbedError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_request() {
        // The endpoint is unreachable, so any request would surface an error.
        let config = EmbedConfig::new("http://127.0.0.1:1", "model");
        let provider = HttpEmbeddingProvider::new(config).unwrap();

        let result = provider.embed_texts(&[]).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(result.dimension, 0);
    }

    #[tokio::test]
    async fn test_unreachable_service_surfaces_request_error() {
        let config = EmbedConfig::new("http://127.0.0.1:1", "model");
        let provider = HttpEmbeddingProvider::new(config).unwrap();

        let texts = vec!["hello".to_string()];
        assert!(matches!(
            provider.embed_texts(&texts).await,
            Err(EmbedError::Request { .. })
        ));
    }
}
