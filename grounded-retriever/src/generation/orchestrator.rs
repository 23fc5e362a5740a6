//! Query-time orchestration: retrieval, grounded prompt assembly, completion,
//! and transcript logging.
//!
//! The orchestrator has two durable-dependent states. **Cold** means no index
//! artifacts exist on disk; **Ready** means they exist and are loaded.
//! Construction transitions Cold to Ready by building from whatever documents
//! are staged, or loads directly into Ready when artifacts already exist.
//!
//! Before each query the orchestrator checks whether the artifacts changed on
//! disk (an out-of-process rebuild) and reloads only then. A failed reload is
//! downgraded to a warning and counted; the request is answered from the
//! in-memory, possibly stale, index.

use crate::error::Result;
use crate::generation::completion::CompletionProvider;
use crate::retrieval::vector_index::{SearchResult, VectorIndex};
use crate::transcript::SessionTranscript;
use grounded_context::Document;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

/// Fixed answer returned when retrieval produces nothing usable.
pub const NO_MATCH_ANSWER: &str = "No relevant documents found.";

/// Sentinel the model is instructed to emit when the context does not
/// support an answer.
pub const NO_SOURCES_MARKER: &str = "Sources: none";

/// Orchestrates the retrieval pipeline for one session.
pub struct RetrievalOrchestrator {
    index: VectorIndex,
    completion: Arc<dyn CompletionProvider>,
    transcript: SessionTranscript,
    last_loaded_mtime: Option<SystemTime>,
    stale_reloads: u64,
}

impl RetrievalOrchestrator {
    /// Build or load the index and open a fresh session transcript.
    ///
    /// With no artifacts on disk the index is built from `documents`; an
    /// empty document set leaves the index empty (queries then return the
    /// fixed not-found answer).
    pub async fn new(
        mut index: VectorIndex,
        completion: Arc<dyn CompletionProvider>,
        transcript_dir: &Path,
        documents: &[Document],
    ) -> Result<Self> {
        index.load(Some(documents)).await?;
        let transcript = SessionTranscript::create(transcript_dir).await?;
        let last_loaded_mtime = index.artifacts_mtime();
        Ok(Self {
            index,
            completion,
            transcript,
            last_loaded_mtime,
            stale_reloads: 0,
        })
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn transcript_path(&self) -> &Path {
        self.transcript.path()
    }

    /// Model identifier of the completion provider.
    pub fn completion_model_id(&self) -> &str {
        self.completion.model_id()
    }

    /// Number of pre-query reloads that failed and fell back to the
    /// in-memory index.
    pub fn stale_reloads(&self) -> u64 {
        self.stale_reloads
    }

    /// Rebuild the index from a new document set and persist it. Returns
    /// the number of chunks indexed in this pass.
    pub async fn rebuild(&mut self, documents: &[Document]) -> Result<usize> {
        let before = self.index.vector_count();
        self.index.build(documents).await?;
        self.last_loaded_mtime = self.index.artifacts_mtime();
        Ok(self.index.vector_count() - before)
    }

    /// Answer a query from the indexed corpus.
    ///
    /// Retrieves the `top_k` nearest chunks, assembles a grounded prompt with
    /// source citations, invokes the completion capability, and appends the
    /// exchange to the session transcript. When retrieval yields nothing (or
    /// only blank chunks) the fixed not-found answer is returned and still
    /// logged. Remote failures during retrieval or completion propagate as
    /// remote-service errors.
    pub async fn answer(&mut self, query: &str, top_k: usize) -> Result<String> {
        self.refresh_from_disk().await;

        let results = self.index.query(query, top_k).await?;
        let has_content = results
            .iter()
            .any(|result| !result.metadata.text.trim().is_empty());
        if !has_content {
            tracing::info!("No relevant context retrieved, returning the fixed answer");
            self.transcript.append(query, NO_MATCH_ANSWER).await?;
            return Ok(NO_MATCH_ANSWER.to_string());
        }

        let context = format_context(&results);
        let prompt = build_prompt(query, &context);
        let answer = self.completion.complete(&prompt).await?;
        self.transcript.append(query, &answer).await?;
        Ok(answer)
    }

    /// Reload the index when its artifacts changed on disk since the last
    /// load. A reload failure is logged and counted; the in-memory state is
    /// kept.
    async fn refresh_from_disk(&mut self) {
        let current = self.index.artifacts_mtime();
        if current == self.last_loaded_mtime {
            return;
        }
        tracing::debug!("Index artifacts changed on disk, reloading");
        match self.index.load(None).await {
            Ok(()) => self.last_loaded_mtime = current,
            Err(e) => {
                self.stale_reloads += 1;
                tracing::warn!("Could not reload index, using the in-memory copy: {e}");
            }
        }
    }
}

/// Format retrieved chunks as labeled context blocks, closest first.
fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|result| {
            let label = match result.metadata.page {
                Some(page) => format!("[Source: {}, p.{}]", result.metadata.source, page),
                None => format!("[Source: {}]", result.metadata.source),
            };
            format!("{label}\n{}", result.metadata.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Assemble the grounding prompt around a query and its context blocks.
fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "You are a document assistant. Answer the question using only the context below.\n\
         If the context does not contain the answer, state that the documents do not \
         contain it and end with the line \"{NO_SOURCES_MARKER}\".\n\
         Otherwise end with a \"Sources:\" line listing only the sources that directly \
         supported your answer, each as \"filename, p.X\".\n\
         \n\
         Question: {query}\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Answer:"
    )
}
