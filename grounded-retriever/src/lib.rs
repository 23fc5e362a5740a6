//! # grounded-retriever
//!
//! Retrieval pipeline for grounded document question answering: a persistent
//! flat similarity index over embedded text chunks, and the query-time
//! orchestration that turns a user question into an answer constrained to
//! the retrieved context, with source attribution.
//!
//! ## Architecture
//!
//! - [`retrieval`]: document loading, the vector index with its two durable
//!   artifacts, and exact nearest-neighbor search
//! - [`generation`]: the completion capability client and the
//!   [`generation::RetrievalOrchestrator`] that assembles grounded prompts
//! - [`transcript`]: the append-only session audit log
//! - [`config`]: TOML-backed configuration for the whole pipeline
//! - [`error`]: the crate error taxonomy and `Result` alias
//!
//! Chunking lives in the `grounded-context` crate and embedding in
//! `grounded-embed`; both plug in here.
//!
//! ## Data flow
//!
//! Documents are chunked, embedded, and appended as (vector, metadata) pairs
//! to the index, which persists as a vector block plus a metadata sequence
//! under one directory. At query time the question is embedded, the nearest
//! chunks are retrieved, and a prompt is built that instructs the model to
//! answer only from those chunks and to cite the sources that supported the
//! answer.
//!
//! ## Concurrency
//!
//! Everything here is request-per-call with sequential awaits and no internal
//! parallelism. The index has no locking discipline of its own; a serving
//! layer that shares one orchestrator across requests must impose its own
//! single-writer guard (see the `grounded-api` crate).

pub mod config;
pub mod error;
pub mod generation;
pub mod retrieval;
pub mod transcript;

pub use config::{CompletionSettings, EmbeddingSettings, RetrieverConfig};
pub use error::{Result, RetrieverError};
pub use generation::{
    CompletionProvider, HttpCompletionProvider, NO_MATCH_ANSWER, RetrievalOrchestrator,
};
pub use retrieval::{ChunkMetadata, SearchResult, TextDirectoryLoader, VectorIndex};
pub use transcript::SessionTranscript;
