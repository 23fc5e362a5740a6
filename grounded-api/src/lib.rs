//! # grounded-api
//!
//! Control surface for the retrieval pipeline, exposed to an external
//! HTTP/UI layer: staging uploads, triggering index builds, answering
//! questions, health reporting, and listing the embedded sources.
//!
//! ## Concurrency
//!
//! One [`Backend`] is constructed at process start and shared across request
//! handlers. The orchestrator it owns is guarded by a read-write lock with
//! single-writer discipline: [`Backend::answer`] and
//! [`Backend::build_index_from_staged`] take the write lock because they
//! mutate orchestrator state (the index, reload bookkeeping, the session
//! transcript); [`Backend::health`] and [`Backend::list_embedded_sources`]
//! are concurrent readers.

use grounded_context::TextSplitter;
use grounded_embed::{EmbeddingProvider, HttpEmbeddingProvider};
use grounded_retriever::{
    CompletionProvider, HttpCompletionProvider, Result, RetrievalOrchestrator, RetrieverConfig,
    TextDirectoryLoader, VectorIndex,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One uploaded file: a name and its raw contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

/// Outcome of a staged build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    /// `"ok"` when documents were indexed, `"empty"` when nothing was staged.
    pub status: String,
    /// Number of chunks indexed in this pass.
    pub chunks_indexed: usize,
}

/// Human-readable component statuses for the external layer's health route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub embedding: String,
    pub index: String,
    pub llm: String,
}

/// Shared backend owning the retrieval orchestrator for one process.
pub struct Backend {
    config: RetrieverConfig,
    orchestrator: RwLock<RetrievalOrchestrator>,
}

impl Backend {
    /// Construct a backend against the configured remote capabilities.
    pub async fn new(config: RetrieverConfig) -> Result<Self> {
        let embedder = Arc::new(HttpEmbeddingProvider::new(
            config.embedding.to_embed_config(),
        )?);
        let completion = Arc::new(HttpCompletionProvider::new(config.completion.clone())?);
        Self::with_providers(config, embedder, completion).await
    }

    /// Construct a backend with explicit providers. The index is loaded
    /// from its artifacts, or built from whatever is staged when none
    /// exist yet.
    pub async fn with_providers(
        config: RetrieverConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        completion: Arc<dyn CompletionProvider>,
    ) -> Result<Self> {
        config.validate()?;
        tokio::fs::create_dir_all(&config.staging_dir).await?;
        tokio::fs::create_dir_all(&config.embedded_dir).await?;

        let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)?;
        let index = VectorIndex::new(config.persist_dir.clone(), splitter, embedder);
        let documents = TextDirectoryLoader::new()
            .load_documents(&config.staging_dir)
            .await?;
        let orchestrator =
            RetrievalOrchestrator::new(index, completion, &config.transcript_dir, &documents)
                .await?;

        tracing::info!(
            "Backend ready: {} vectors indexed, transcript at {}",
            orchestrator.index().vector_count(),
            orchestrator.transcript_path().display()
        );
        Ok(Self {
            config,
            orchestrator: RwLock::new(orchestrator),
        })
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// Write uploaded files into the staging directory, returning the
    /// accepted file names. A file that cannot be written is logged and
    /// skipped; the rest of the batch continues.
    pub async fn stage_upload(&self, files: Vec<StagedFile>) -> Vec<String> {
        let mut accepted = Vec::new();
        for file in files {
            let Some(name) = sanitize_file_name(&file.name) else {
                tracing::warn!("Rejecting upload with unusable name: {:?}", file.name);
                continue;
            };
            let path = self.config.staging_dir.join(&name);
            match tokio::fs::write(&path, &file.contents).await {
                Ok(()) => {
                    tracing::info!("Staged {} ({} bytes)", name, file.contents.len());
                    accepted.push(name);
                }
                Err(e) => {
                    tracing::warn!("Could not stage {name}: {e}");
                }
            }
        }
        accepted
    }

    /// Index everything currently staged and move the staged files into the
    /// embedded directory.
    pub async fn build_index_from_staged(&self) -> Result<BuildReport> {
        let documents = TextDirectoryLoader::new()
            .load_documents(&self.config.staging_dir)
            .await?;
        if documents.is_empty() {
            tracing::info!("Nothing staged, skipping index build");
            return Ok(BuildReport {
                status: "empty".to_string(),
                chunks_indexed: 0,
            });
        }

        let chunks_indexed = {
            let mut orchestrator = self.orchestrator.write().await;
            orchestrator.rebuild(&documents).await?
        };

        for document in &documents {
            let src = self.config.staging_dir.join(&document.source);
            let dst = self.config.embedded_dir.join(&document.source);
            if let Err(e) = tokio::fs::rename(&src, &dst).await {
                tracing::warn!(
                    "Could not move {} to the embedded directory: {e}",
                    document.source
                );
            }
        }

        tracing::info!(
            "Indexed {} chunks from {} staged documents",
            chunks_indexed,
            documents.len()
        );
        Ok(BuildReport {
            status: "ok".to_string(),
            chunks_indexed,
        })
    }

    /// Answer a query against the indexed corpus.
    pub async fn answer(&self, query: &str, top_k: usize) -> Result<String> {
        let mut orchestrator = self.orchestrator.write().await;
        orchestrator.answer(query, top_k).await
    }

    /// Component statuses for the external layer's health route.
    pub async fn health(&self) -> Health {
        let orchestrator = self.orchestrator.read().await;
        let index = orchestrator.index();
        let index_status = match index.dimension() {
            Some(dimension) => format!(
                "index: {} vectors, dimension {}",
                index.vector_count(),
                dimension
            ),
            None => "index: not built".to_string(),
        };
        Health {
            embedding: format!("embedding model: {}", index.model_id()),
            index: index_status,
            llm: format!("completion model: {}", orchestrator.completion_model_id()),
        }
    }

    /// Distinct source names currently in the index, in insertion order.
    pub async fn list_embedded_sources(&self) -> Vec<String> {
        self.orchestrator.read().await.index().sources()
    }
}

/// Reduce an uploaded name to its final path component so uploads cannot
/// escape the staging directory.
fn sanitize_file_name(name: &str) -> Option<String> {
    let name = Path::new(name).file_name()?.to_string_lossy().into_owned();
    if name.is_empty() || name == ".." {
        return None;
    }
    Some(name)
}
