//! Integration tests for the backend control surface
//!
//! These exercise the full upload → build → answer flow with local
//! stand-ins for the remote embedding and completion capabilities.

use anyhow::Result;
use async_trait::async_trait;
use grounded_api::{Backend, StagedFile};
use grounded_embed::{EmbeddingProvider, EmbeddingResult};
use grounded_retriever::{CompletionProvider, NO_MATCH_ANSWER, RetrieverConfig};
use std::path::Path;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

struct HistogramEmbedder;

fn histogram(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; 16];
    for byte in text.bytes() {
        vector[byte as usize % 16] += 1.0;
    }
    vector
}

#[async_trait]
impl EmbeddingProvider for HistogramEmbedder {
    async fn embed_text(&self, text: &str) -> grounded_embed::Result<Vec<f32>> {
        Ok(histogram(text))
    }

    async fn embed_texts(&self, texts: &[String]) -> grounded_embed::Result<EmbeddingResult> {
        Ok(EmbeddingResult::new(texts.iter().map(|t| histogram(t)).collect()))
    }

    fn model_id(&self) -> &str {
        "histogram-test-model"
    }
}

/// Echoes the prompt back so tests can observe the assembled context.
struct EchoCompletion;

#[async_trait]
impl CompletionProvider for EchoCompletion {
    async fn complete(&self, prompt: &str) -> grounded_retriever::Result<String> {
        Ok(prompt.to_string())
    }

    fn model_id(&self) -> &str {
        "echo-test-model"
    }
}

fn test_config(root: &Path) -> RetrieverConfig {
    RetrieverConfig::default()
        .with_persist_dir(root.join("store"))
        .with_staging_dir(root.join("staged"))
        .with_embedded_dir(root.join("embedded"))
        .with_transcript_dir(root.join("transcripts"))
}

async fn test_backend(root: &TempDir) -> Result<Backend> {
    Ok(Backend::with_providers(
        test_config(root.path()),
        Arc::new(HistogramEmbedder),
        Arc::new(EchoCompletion),
    )
    .await?)
}

#[tokio::test]
async fn test_upload_build_answer_flow() -> Result<()> {
    let root = tempdir()?;
    let backend = test_backend(&root).await?;

    let accepted = backend
        .stage_upload(vec![StagedFile {
            name: "policy.txt".to_string(),
            contents: b"Notice period is 30 days.".to_vec(),
        }])
        .await;
    assert_eq!(accepted, vec!["policy.txt"]);

    let report = backend.build_index_from_staged().await?;
    assert_eq!(report.status, "ok");
    assert_eq!(report.chunks_indexed, 1);

    // Staged files move to the embedded directory after indexing.
    assert!(!root.path().join("staged/policy.txt").exists());
    assert!(root.path().join("embedded/policy.txt").exists());
    assert_eq!(backend.list_embedded_sources().await, vec!["policy.txt"]);

    let answer = backend.answer("What is the notice period?", 3).await?;
    assert!(answer.contains("30 days"));
    assert!(answer.contains("policy.txt"));

    Ok(())
}

#[tokio::test]
async fn test_upload_strips_path_components() -> Result<()> {
    let root = tempdir()?;
    let backend = test_backend(&root).await?;

    let accepted = backend
        .stage_upload(vec![
            StagedFile {
                name: "../escape.txt".to_string(),
                contents: b"contained".to_vec(),
            },
            StagedFile {
                name: String::new(),
                contents: b"nameless".to_vec(),
            },
        ])
        .await;

    assert_eq!(accepted, vec!["escape.txt"]);
    assert!(root.path().join("staged/escape.txt").exists());
    assert!(!root.path().join("escape.txt").exists());

    Ok(())
}

#[tokio::test]
async fn test_build_with_nothing_staged_reports_empty() -> Result<()> {
    let root = tempdir()?;
    let backend = test_backend(&root).await?;

    let report = backend.build_index_from_staged().await?;
    assert_eq!(report.status, "empty");
    assert_eq!(report.chunks_indexed, 0);
    assert!(backend.list_embedded_sources().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_answer_without_index_returns_not_found() -> Result<()> {
    let root = tempdir()?;
    let backend = test_backend(&root).await?;

    let answer = backend.answer("anything?", 5).await?;
    assert_eq!(answer, NO_MATCH_ANSWER);

    Ok(())
}

#[tokio::test]
async fn test_health_reports_all_three_components() -> Result<()> {
    let root = tempdir()?;
    let backend = test_backend(&root).await?;

    let health = backend.health().await;
    assert_eq!(health.embedding, "embedding model: histogram-test-model");
    assert_eq!(health.index, "index: not built");
    assert_eq!(health.llm, "completion model: echo-test-model");

    backend
        .stage_upload(vec![StagedFile {
            name: "policy.txt".to_string(),
            contents: b"Notice period is 30 days.".to_vec(),
        }])
        .await;
    backend.build_index_from_staged().await?;

    let health = backend.health().await;
    assert_eq!(health.index, "index: 1 vectors, dimension 16");

    Ok(())
}

#[tokio::test]
async fn test_backend_restart_loads_persisted_index() -> Result<()> {
    let root = tempdir()?;
    {
        let backend = test_backend(&root).await?;
        backend
            .stage_upload(vec![StagedFile {
                name: "policy.txt".to_string(),
                contents: b"Notice period is 30 days.".to_vec(),
            }])
            .await;
        backend.build_index_from_staged().await?;
    }

    // A fresh backend over the same directories reaches Ready from the
    // artifacts alone; the staged directory is empty now.
    let backend = test_backend(&root).await?;
    assert_eq!(backend.list_embedded_sources().await, vec!["policy.txt"]);

    let answer = backend.answer("What is the notice period?", 1).await?;
    assert!(answer.contains("30 days"));

    Ok(())
}
