//! # grounded-embed
//!
//! Client library for a remote embedding capability, converting batches of
//! text segments into fixed-dimension vectors. Designed for async operation
//! with a provider trait so callers can swap the remote service for a local
//! stub in tests.
//!
//! ## Contract
//!
//! - **Order-preserving**: one vector per input text, in input order.
//! - **Batched**: texts are grouped into requests of at most `batch_size`
//!   items, one remote call per batch. A failed batch aborts the whole pass;
//!   individual calls are never retried here.
//! - **Degenerate input**: an empty input yields an empty result with no
//!   remote call.
//! - **Fixed dimensionality**: vectors for one model identifier always have
//!   identical dimensionality. A response with ragged dimensions is rejected
//!   rather than truncated or padded.
//!
//! ## Quick Start
//!
//! ```no_run
//! use grounded_embed::{EmbedConfig, EmbeddingProvider, HttpEmbeddingProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = HttpEmbeddingProvider::new(
//!     EmbedConfig::new("http://127.0.0.1:8000/v1", "bge-base-en-v1.5"),
//! )?;
//!
//! let texts = vec!["Hello world".to_string(), "How are you?".to_string()];
//! let result = provider.embed_texts(&texts).await?;
//!
//! println!("Generated {} embeddings of dimension {}", result.len(), result.dimension);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod provider;

// Re-export main types for easy access
pub use config::EmbedConfig;
pub use error::{EmbedError, Result};
pub use provider::{EmbeddingProvider, EmbeddingResult, HttpEmbeddingProvider};
