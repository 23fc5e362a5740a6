//! This module splits normalized document text into overlapping, bounded
//! segments suitable for embedding and retrieval.
//!
//! Splitting is driven by a prioritized separator list: the splitter first
//! tries to break text at paragraph boundaries, then line boundaries, then
//! word boundaries, and only falls back to raw character windows when a run
//! of text has no separator at all. Adjacent chunks share a configurable
//! amount of trailing context so that a sentence cut at a chunk boundary is
//! still retrievable from the following chunk.
//!
//! The two main types are:
//! - [`TextSplitter`]: holds the separator set and size/overlap configuration
//!   and performs the actual splitting.
//! - [`TextChunk`]: one bounded segment of a [`Document`], carrying the
//!   source identifier and page number needed to cite it later.
//!
//! # Usage
//!
//! ```
//! use grounded_context::{Document, TextSplitter};
//!
//! let splitter = TextSplitter::new(1000, 200).unwrap();
//! let documents = vec![Document {
//!     text: "Notice period is 30 days.".to_string(),
//!     source: "policy.txt".to_string(),
//!     page: None,
//! }];
//!
//! let chunks = splitter.split_documents(&documents);
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].source, "policy.txt");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Default separator patterns, ordered from most to least significant:
/// paragraph breaks, line breaks, then spaces. Runs with none of these are
/// split into raw character windows as a last resort.
pub const DEFAULT_SEPARATORS: &[&str] = &[r"\n\n", r"\n", r" "];

/// Error raised for invalid splitter configuration. Splitting itself is
/// infallible once a splitter has been constructed.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("invalid splitter configuration: {message}")]
    InvalidConfig { message: String },
}

impl SplitError {
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// A normalized document as produced by a document loader. Immutable once
/// loaded; splitting never mutates the original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Full normalized text of the document (or of one page of it).
    pub text: String,
    /// Identifier of the originating file, used for citations.
    pub source: String,
    /// 1-based page number, absent for non-paginated formats.
    pub page: Option<u32>,
}

/// One bounded segment of a document, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// The text content of this segment, including any leading overlap
    /// shared with the previous chunk of the same document.
    pub text: String,
    /// Source identifier inherited from the parent document.
    pub source: String,
    /// Page number inherited from the parent document.
    pub page: Option<u32>,
}

/// Splits document text on a prioritized separator list into chunks of at
/// most `chunk_size` bytes, with adjacent chunks sharing up to
/// `chunk_overlap` bytes of context.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    separators: Vec<Regex>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Creates a splitter with the default separator set.
    ///
    /// Fails fast on invalid configuration: `chunk_size` must be positive
    /// and `chunk_overlap` strictly smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, SplitError> {
        Self::with_separators(DEFAULT_SEPARATORS, chunk_size, chunk_overlap)
    }

    /// Creates a splitter with custom separator patterns, applied in order
    /// from most significant to least significant.
    pub fn with_separators(
        patterns: &[&str],
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, SplitError> {
        if chunk_size == 0 {
            return Err(SplitError::invalid_config("chunk_size must be positive"));
        }
        if chunk_overlap >= chunk_size {
            return Err(SplitError::invalid_config(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        let separators = patterns
            .iter()
            .map(|&pattern| {
                Regex::new(pattern).map_err(|e| {
                    SplitError::invalid_config(format!("bad separator pattern {pattern:?}: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TextSplitter {
            separators,
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits every document and tags each resulting chunk with its parent's
    /// source and page. A document may yield zero chunks (empty text).
    pub fn split_documents(&self, documents: &[Document]) -> Vec<TextChunk> {
        let mut chunks = Vec::new();
        for document in documents {
            for text in self.split_text(&document.text) {
                chunks.push(TextChunk {
                    text,
                    source: document.source.clone(),
                    page: document.page,
                });
            }
        }
        chunks
    }

    /// Splits a single text into chunk strings.
    ///
    /// Segments produced by the recursive separator pass are merged greedily
    /// into chunks of at most `chunk_size` bytes; when a chunk is emitted,
    /// the next one restarts `chunk_overlap` bytes before the previous
    /// chunk's end (clamped so the new chunk still fits the size budget).
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let segments = self.split_recursively(text, 0, 0);

        let mut chunks: Vec<String> = Vec::new();
        let mut start = 0usize;
        let mut end = 0usize;

        for segment in segments {
            let segment_len = segment.end - segment.start;
            if end - start + segment_len > self.chunk_size && start != end {
                chunks.push(text[start..end].to_string());
                // Restart the next chunk inside the previous one to carry
                // overlap context, without exceeding the size budget once
                // the new segment is appended.
                let overlap_start = end.saturating_sub(self.chunk_overlap);
                let size_floor = segment.end.saturating_sub(self.chunk_size);
                start = previous_char_boundary(text, overlap_start.max(size_floor).max(start));
                end = segment.end;
            } else {
                if start == end {
                    start = segment.start;
                }
                end = segment.end;
            }
        }

        if start != end {
            chunks.push(text[start..end].to_string());
        }

        chunks
    }

    // Recursively splits the text into byte ranges that are each at most
    // chunk_size long, preferring the most significant separator that
    // applies. Ranges are contiguous and cover the whole input.
    fn split_recursively(
        &self,
        text: &str,
        separator_idx: usize,
        current_offset: usize,
    ) -> Vec<Range<usize>> {
        let mut segments: Vec<Range<usize>> = Vec::new();

        if text.is_empty() {
            return segments;
        }

        // Already small enough: keep as a single segment.
        if text.len() <= self.chunk_size {
            segments.push(current_offset..current_offset + text.len());
            return segments;
        }

        // Separators exhausted: fall back to raw character windows. A single
        // character wider than the budget is taken whole.
        if separator_idx >= self.separators.len() {
            let mut local_start = 0;
            while local_start < text.len() {
                let mut local_end = (local_start + self.chunk_size).min(text.len());
                local_end = previous_char_boundary(text, local_end);
                if local_end <= local_start {
                    local_end = next_char_boundary(text, local_start + 1);
                }
                segments.push(current_offset + local_start..current_offset + local_end);
                local_start = local_end;
            }
            return segments;
        }

        let separator = &self.separators[separator_idx];
        let mut local_start = 0;

        for mat in separator.find_iter(text) {
            if mat.start() > local_start {
                let sub_text = &text[local_start..mat.start()];
                segments.extend(self.split_recursively(
                    sub_text,
                    separator_idx + 1,
                    current_offset + local_start,
                ));
            }
            // The separator itself stays in the stream so chunks reconstruct
            // the original text.
            segments.push(current_offset + mat.start()..current_offset + mat.end());
            local_start = mat.end();
        }

        if local_start < text.len() {
            let sub_text = &text[local_start..];
            segments.extend(self.split_recursively(
                sub_text,
                separator_idx + 1,
                current_offset + local_start,
            ));
        }

        segments
    }
}

fn previous_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn next_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
