//! Plain-text document loading.
//!
//! Richer formats (PDF, Office documents) are the job of an external loader;
//! this one covers the plain-text formats needed to exercise the build path
//! end-to-end. Individual unreadable files are skipped and logged, never
//! aborting the whole batch.

use crate::error::{Result, RetrieverError};
use grounded_context::Document;
use std::path::Path;

/// Loads `.txt` and `.md` files from a directory into [`Document`]s, with
/// `source` set to the file name and no page numbers.
#[derive(Debug, Clone, Default)]
pub struct TextDirectoryLoader;

impl TextDirectoryLoader {
    pub fn new() -> Self {
        Self
    }

    fn is_supported(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("txt") | Some("md")
        )
    }

    /// Load every supported file under `dir`, in file-name order.
    ///
    /// A missing or unreadable directory is a loader error; a failing
    /// individual file is skipped with a warning.
    pub async fn load_documents(&self, dir: &Path) -> Result<Vec<Document>> {
        let mut entries = Vec::new();
        let mut read_dir = std::fs::read_dir(dir).map_err(|e| {
            RetrieverError::loader(format!("cannot read directory {}: {e}", dir.display()))
        })?;
        while let Some(entry) = read_dir.next().transpose().map_err(|e| {
            RetrieverError::loader(format!("cannot read directory {}: {e}", dir.display()))
        })? {
            entries.push(entry.path());
        }
        entries.sort();

        let mut documents = Vec::new();
        for path in entries {
            if !path.is_file() || !Self::is_supported(&path) {
                continue;
            }
            let source = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            match tokio::fs::read_to_string(&path).await {
                Ok(text) => {
                    tracing::debug!("Loaded {} ({} bytes)", source, text.len());
                    documents.push(Document {
                        text,
                        source,
                        page: None,
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {e}", path.display());
                }
            }
        }

        tracing::info!("Loaded {} documents from {}", documents.len(), dir.display());
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_loads_supported_files_in_name_order() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "second").unwrap();
        std::fs::write(dir.path().join("a.md"), "first").unwrap();
        std::fs::write(dir.path().join("ignored.pdf"), "binary").unwrap();

        let documents = TextDirectoryLoader::new()
            .load_documents(dir.path())
            .await
            .unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].source, "a.md");
        assert_eq!(documents[0].text, "first");
        assert_eq!(documents[1].source, "b.txt");
        assert!(documents.iter().all(|d| d.page.is_none()));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("good.txt"), "fine").unwrap();
        // Invalid UTF-8 makes read_to_string fail for this entry.
        std::fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0x00]).unwrap();

        let documents = TextDirectoryLoader::new()
            .load_documents(dir.path())
            .await
            .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].source, "good.txt");
    }

    #[tokio::test]
    async fn test_missing_directory_is_a_loader_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        let result = TextDirectoryLoader::new().load_documents(&missing).await;
        assert!(matches!(result, Err(RetrieverError::Loader { .. })));
    }

    #[tokio::test]
    async fn test_empty_directory_yields_no_documents() {
        let dir = tempdir().unwrap();

        let documents = TextDirectoryLoader::new()
            .load_documents(dir.path())
            .await
            .unwrap();
        assert!(documents.is_empty());
    }
}
