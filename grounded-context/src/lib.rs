pub mod text;

// Re-export the main splitting types for external use
pub use text::{DEFAULT_SEPARATORS, Document, SplitError, TextChunk, TextSplitter};
