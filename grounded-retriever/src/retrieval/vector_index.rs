//! Flat similarity index with positional metadata and durable artifacts.
//!
//! The index stores vectors in one contiguous `f32` block and chunk metadata
//! in a parallel ordered store. The i-th metadata record always describes the
//! i-th stored vector; this positional correspondence is the only linkage, so
//! every mutation goes through a single append path ([`VectorIndex::add`])
//! that takes vectors and metadata together and validates before touching
//! either store.
//!
//! Durable form: two companion artifacts under the persist directory, a
//! binary vector block (`vectors.bin`) and a JSON metadata sequence
//! (`metadata.json`). Each artifact is written to a temp file and renamed
//! into place; cross-artifact atomicity is best-effort, and a load treats
//! one-present-one-missing as an inconsistent state.

use crate::error::{Result, RetrieverError};
use grounded_context::{Document, TextChunk, TextSplitter};
use grounded_embed::EmbeddingProvider;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// File name of the serialized vector block.
pub const VECTOR_ARTIFACT: &str = "vectors.bin";
/// File name of the serialized metadata sequence.
pub const METADATA_ARTIFACT: &str = "metadata.json";

const VECTOR_MAGIC: &[u8; 8] = b"GRNDVEC1";
const VECTOR_HEADER_LEN: usize = 8 + 4 + 8;

/// Metadata stored alongside each vector: enough to reconstruct a citation
/// and the original chunk content without re-reading the source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// The chunk text that was embedded.
    pub text: String,
    /// Source identifier of the originating document.
    pub source: String,
    /// 1-based page number, absent for non-paginated formats.
    pub page: Option<u32>,
}

impl From<TextChunk> for ChunkMetadata {
    fn from(chunk: TextChunk) -> Self {
        Self {
            text: chunk.text,
            source: chunk.source,
            page: chunk.page,
        }
    }
}

/// One search hit, produced transiently per query and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Insertion position of the matched vector.
    pub position: usize,
    /// Squared Euclidean distance to the query vector.
    pub distance: f32,
    pub metadata: ChunkMetadata,
}

/// Append-only flat similarity index over fixed-dimension vectors.
pub struct VectorIndex {
    /// Contiguous vector block, `dimension` floats per entry.
    vectors: Vec<f32>,
    /// Fixed by the first non-empty add or a successful load.
    dimension: Option<usize>,
    metadata: Vec<ChunkMetadata>,
    persist_dir: PathBuf,
    splitter: TextSplitter,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("vector_count", &self.vector_count())
            .field("dimension", &self.dimension)
            .field("persist_dir", &self.persist_dir)
            .finish()
    }
}

impl VectorIndex {
    /// Create an empty index that persists under `persist_dir`.
    pub fn new(
        persist_dir: impl Into<PathBuf>,
        splitter: TextSplitter,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            vectors: Vec::new(),
            dimension: None,
            metadata: Vec::new(),
            persist_dir: persist_dir.into(),
            splitter,
            embedder,
        }
    }

    pub fn persist_dir(&self) -> &Path {
        &self.persist_dir
    }

    /// Number of vectors currently stored.
    pub fn vector_count(&self) -> usize {
        match self.dimension {
            Some(dimension) => self.vectors.len() / dimension,
            None => 0,
        }
    }

    /// Dimensionality of stored vectors, `None` until the first add or load.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Model identifier of the embedding provider backing this index.
    pub fn model_id(&self) -> &str {
        self.embedder.model_id()
    }

    fn vector_artifact_path(&self) -> PathBuf {
        self.persist_dir.join(VECTOR_ARTIFACT)
    }

    fn metadata_artifact_path(&self) -> PathBuf {
        self.persist_dir.join(METADATA_ARTIFACT)
    }

    /// Chunk, embed, append, and persist a document set.
    ///
    /// An empty document set (or one that yields no chunks) is a logged
    /// no-op: nothing is appended and no artifacts are written.
    pub async fn build(&mut self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            tracing::info!("No documents provided, skipping index build");
            return Ok(());
        }

        tracing::info!("Building vector index from {} documents", documents.len());
        let chunks = self.splitter.split_documents(documents);
        if chunks.is_empty() {
            tracing::info!("No chunks produced from documents, skipping index build");
            return Ok(());
        }
        tracing::info!(
            "Split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let result = self.embedder.embed_texts(&texts).await?;
        let metadatas: Vec<ChunkMetadata> = chunks.into_iter().map(ChunkMetadata::from).collect();

        self.add(result.embeddings, metadatas)?;
        self.save().await?;
        tracing::info!(
            "Vector index built and saved to {}",
            self.persist_dir.display()
        );
        Ok(())
    }

    /// Append vectors and their metadata to the in-memory index.
    ///
    /// This is the only mutation path. The first non-empty add fixes the
    /// index dimensionality from the first vector; every vector of every
    /// later add must match it. All validation happens before any mutation,
    /// so a failed add leaves the index unchanged.
    pub fn add(&mut self, vectors: Vec<Vec<f32>>, metadatas: Vec<ChunkMetadata>) -> Result<()> {
        if vectors.len() != metadatas.len() {
            return Err(RetrieverError::config(format!(
                "vector and metadata counts differ: {} vs {}",
                vectors.len(),
                metadatas.len()
            )));
        }
        if vectors.is_empty() {
            tracing::debug!("No vectors to add, skipping");
            return Ok(());
        }

        let expected = self.dimension.unwrap_or(vectors[0].len());
        if expected == 0 {
            return Err(RetrieverError::config("embedding vectors must not be empty"));
        }
        for vector in &vectors {
            if vector.len() != expected {
                return Err(RetrieverError::DimensionalityMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        self.dimension = Some(expected);
        self.vectors.reserve(vectors.len() * expected);
        for vector in &vectors {
            self.vectors.extend_from_slice(vector);
        }
        self.metadata.extend(metadatas);
        debug_assert_eq!(self.metadata.len(), self.vector_count());

        tracing::info!("Added {} vectors to the index", vectors.len());
        Ok(())
    }

    /// Serialize the vector block and the metadata store to their companion
    /// artifacts. Each artifact is written to a temp file and renamed into
    /// place; a crash between the two renames can still leave the pair out
    /// of step, which [`VectorIndex::load`] reports as inconsistent.
    pub async fn save(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.persist_dir).await?;

        let dimension = self.dimension.unwrap_or(0);
        let count = self.vector_count() as u64;
        let mut bytes = Vec::with_capacity(VECTOR_HEADER_LEN + self.vectors.len() * 4);
        bytes.extend_from_slice(VECTOR_MAGIC);
        bytes.extend_from_slice(&(dimension as u32).to_le_bytes());
        bytes.extend_from_slice(&count.to_le_bytes());
        bytes.extend_from_slice(bytemuck::cast_slice::<f32, u8>(&self.vectors));
        write_replacing(&self.vector_artifact_path(), &bytes).await?;

        let metadata_json = serde_json::to_vec(&self.metadata)?;
        write_replacing(&self.metadata_artifact_path(), &metadata_json).await?;

        tracing::info!(
            "Saved {} vectors and metadata to {}",
            count,
            self.persist_dir.display()
        );
        Ok(())
    }

    /// Load the index from its durable artifacts, replacing any in-memory
    /// state.
    ///
    /// If neither artifact exists and `documents` was supplied, falls back
    /// to [`VectorIndex::build`]; without documents this is
    /// [`RetrieverError::ArtifactsNotFound`]. Exactly one artifact present
    /// is an inconsistent state and fails rather than guessing.
    pub async fn load(&mut self, documents: Option<&[Document]>) -> Result<()> {
        let vector_path = self.vector_artifact_path();
        let metadata_path = self.metadata_artifact_path();

        match (vector_path.exists(), metadata_path.exists()) {
            (true, true) => {}
            (false, false) => {
                return match documents {
                    Some(documents) => {
                        tracing::info!("Index artifacts not found, building a new index");
                        self.build(documents).await
                    }
                    None => Err(RetrieverError::ArtifactsNotFound {
                        dir: self.persist_dir.clone(),
                    }),
                };
            }
            (true, false) => {
                return Err(RetrieverError::InconsistentArtifacts {
                    present: vector_path,
                    missing: metadata_path,
                });
            }
            (false, true) => {
                return Err(RetrieverError::InconsistentArtifacts {
                    present: metadata_path,
                    missing: vector_path,
                });
            }
        }

        let bytes = tokio::fs::read(&vector_path).await?;
        if bytes.len() < VECTOR_HEADER_LEN || &bytes[..8] != VECTOR_MAGIC {
            return Err(RetrieverError::corrupt_artifact(
                vector_path,
                "bad magic or truncated header",
            ));
        }
        let dimension =
            u32::from_le_bytes(bytes[8..12].try_into().expect("sliced 4 bytes")) as usize;
        let count = u64::from_le_bytes(bytes[12..20].try_into().expect("sliced 8 bytes")) as usize;
        let data = &bytes[VECTOR_HEADER_LEN..];
        if count > 0 && dimension == 0 {
            return Err(RetrieverError::corrupt_artifact(
                vector_path,
                "non-empty index with zero dimension",
            ));
        }
        if data.len() != count * dimension * 4 {
            return Err(RetrieverError::corrupt_artifact(
                vector_path,
                format!(
                    "vector block holds {} bytes, header promises {}",
                    data.len(),
                    count * dimension * 4
                ),
            ));
        }
        let vectors: Vec<f32> = bytemuck::pod_collect_to_vec::<u8, f32>(data);

        let metadata_text = tokio::fs::read_to_string(&metadata_path).await?;
        let metadata: Vec<ChunkMetadata> = serde_json::from_str(&metadata_text)
            .map_err(|e| RetrieverError::corrupt_artifact(metadata_path.clone(), e.to_string()))?;
        if metadata.len() != count {
            return Err(RetrieverError::corrupt_artifact(
                metadata_path,
                format!("{} metadata records for {} vectors", metadata.len(), count),
            ));
        }

        self.vectors = vectors;
        self.metadata = metadata;
        self.dimension = if count == 0 { None } else { Some(dimension) };
        tracing::info!(
            "Loaded {} vectors and metadata from {}",
            count,
            self.persist_dir.display()
        );
        Ok(())
    }

    /// Exact nearest-neighbor scan by squared Euclidean distance.
    ///
    /// Returns up to `top_k` results ordered by ascending distance; ties
    /// keep insertion order (the scan is stable). A never-built index
    /// returns an empty sequence, not an error. A query vector whose
    /// dimensionality differs from the index fails loudly.
    pub fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let Some(dimension) = self.dimension else {
            tracing::info!("Vector index is empty, returning no results");
            return Ok(Vec::new());
        };
        if query_vector.len() != dimension {
            return Err(RetrieverError::DimensionalityMismatch {
                expected: dimension,
                actual: query_vector.len(),
            });
        }

        let mut results: Vec<SearchResult> = self
            .metadata
            .iter()
            .enumerate()
            .map(|(position, metadata)| {
                let stored = &self.vectors[position * dimension..(position + 1) * dimension];
                SearchResult {
                    position,
                    distance: squared_l2(query_vector, stored),
                    metadata: metadata.clone(),
                }
            })
            .collect();

        // Stable sort keeps lower insertion positions first on equal distance.
        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        Ok(results)
    }

    /// Embed `query_text` and search, as one convenience call.
    pub async fn query(&self, query_text: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        tracing::debug!("Querying vector index for: {query_text:?}");
        if self.dimension.is_none() {
            tracing::info!("Vector index is empty, returning no results");
            return Ok(Vec::new());
        }
        let query_vector = self.embedder.embed_text(query_text).await?;
        self.search(&query_vector, top_k)
    }

    /// Distinct source identifiers in insertion order.
    pub fn sources(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut sources = Vec::new();
        for metadata in &self.metadata {
            if seen.insert(metadata.source.as_str()) {
                sources.push(metadata.source.clone());
            }
        }
        sources
    }

    /// Newest modification timestamp of the two durable artifacts, or `None`
    /// when either is missing. Drives the reload-if-changed policy in the
    /// orchestrator.
    pub fn artifacts_mtime(&self) -> Option<SystemTime> {
        let vector_mtime = std::fs::metadata(self.vector_artifact_path())
            .ok()?
            .modified()
            .ok()?;
        let metadata_mtime = std::fs::metadata(self.metadata_artifact_path())
            .ok()?
            .modified()
            .ok()?;
        Some(vector_mtime.max(metadata_mtime))
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

async fn write_replacing(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
