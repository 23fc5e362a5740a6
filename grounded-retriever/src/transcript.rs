//! Append-only session transcript.
//!
//! One file per orchestrator lifetime, created at construction and named
//! with the creation timestamp. The system writes it and never reads it
//! back; it exists as an audit trail.

use crate::error::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const SEPARATOR_WIDTH: usize = 80;

/// Write-only log of `(query, answer)` exchanges.
#[derive(Debug)]
pub struct SessionTranscript {
    path: PathBuf,
}

impl SessionTranscript {
    /// Create the transcript file under `dir`, named with the current UTC
    /// timestamp. The directory is created if needed.
    pub async fn create(dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let path = dir.join(format!("session-{stamp}.log"));
        tokio::fs::File::create(&path).await?;
        tracing::info!("Session transcript created at {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one exchange: a `USER:` line, an `ASSISTANT:` line, and a
    /// separator line.
    pub async fn append(&self, query: &str, answer: &str) -> Result<()> {
        let record = format!(
            "USER: {query}\nASSISTANT: {answer}\n{}\n",
            "-".repeat(SEPARATOR_WIDTH)
        );
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(record.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_names_file_with_timestamp() {
        let dir = tempdir().unwrap();
        let transcript = SessionTranscript::create(dir.path()).await.unwrap();

        let name = transcript.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("session-"));
        assert!(name.ends_with(".log"));
        assert!(transcript.path().exists());
    }

    #[tokio::test]
    async fn test_append_writes_three_part_records() {
        let dir = tempdir().unwrap();
        let transcript = SessionTranscript::create(dir.path()).await.unwrap();

        transcript.append("first question", "first answer").await.unwrap();
        transcript.append("second question", "second answer").await.unwrap();

        let contents = std::fs::read_to_string(transcript.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "USER: first question");
        assert_eq!(lines[1], "ASSISTANT: first answer");
        assert_eq!(lines[2], "-".repeat(80));
        assert_eq!(lines[3], "USER: second question");
    }
}
