//! Document loading and the persistent similarity index.

pub mod loader;
pub mod vector_index;

pub use loader::TextDirectoryLoader;
pub use vector_index::{ChunkMetadata, SearchResult, VectorIndex};
