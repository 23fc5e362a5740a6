//! Completion capability client and query-time orchestration.

pub mod completion;
pub mod orchestrator;

pub use completion::{CompletionProvider, HttpCompletionProvider};
pub use orchestrator::{NO_MATCH_ANSWER, NO_SOURCES_MARKER, RetrievalOrchestrator};
