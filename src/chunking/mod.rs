//! Text chunking for breaking documents into retrievable segments.
//!
//! Chunks never cross a page boundary. Consecutive chunks of the same page
//! share an overlap region so context at a cut is not lost.

mod recursive;

pub use recursive::RecursiveChunker;

use crate::config::ChunkingSettings;
use crate::document::Document;
use crate::error::{PagewiseError, Result};
use serde::{Deserialize, Serialize};

/// A contiguous segment of one page's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub text: String,
    /// Page the chunk was cut from, if the page number is known.
    pub source_page: Option<u32>,
    /// Position among all chunks of the document.
    pub sequence_index: usize,
    /// Characters shared with the preceding chunk of the same page.
    pub overlap_with_previous: usize,
    /// Character offset of the chunk within its page.
    pub start_char: usize,
}

impl Chunk {
    /// Length of the chunk in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Page number for display.
    pub fn page_label(&self) -> String {
        self.source_page
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// First `max_chars` characters on a single line, with an ellipsis if cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let flat = self.text.replace(['\n', '\r'], " ");
        if flat.chars().count() <= max_chars {
            flat
        } else {
            let cut: String = flat.chars().take(max_chars).collect();
            format!("{}...", cut)
        }
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub max_chunk_size: usize,
    /// Characters shared between consecutive chunks of a page.
    pub overlap_size: usize,
}

impl ChunkingConfig {
    pub fn new(max_chunk_size: usize, overlap_size: usize) -> Self {
        Self {
            max_chunk_size,
            overlap_size,
        }
    }

    /// Reject sizes that cannot make progress through a page.
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(PagewiseError::Config(
                "max_chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.overlap_size >= self.max_chunk_size {
            return Err(PagewiseError::Config(format!(
                "overlap_size ({}) must be less than max_chunk_size ({})",
                self.overlap_size, self.max_chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            overlap_size: 200,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self::new(settings.max_chunk_size, settings.overlap_size)
    }
}

/// Trait for chunking implementations.
///
/// Splitting is deterministic: the same document always yields the same chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks ordered by page, then position.
    fn split(&self, document: &Document) -> Vec<Chunk>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, page: Option<u32>) -> Chunk {
        Chunk {
            text: text.to_string(),
            source_page: page,
            sequence_index: 0,
            overlap_with_previous: 0,
            start_char: 0,
        }
    }

    #[test]
    fn test_preview_is_char_safe() {
        let c = chunk("héllo wörld, ünïcode everywhere", Some(1));
        assert_eq!(c.preview(5), "héllo...");
        assert_eq!(c.preview(100), "héllo wörld, ünïcode everywhere");
    }

    #[test]
    fn test_preview_flattens_newlines() {
        let c = chunk("line one\nline two", None);
        assert_eq!(c.preview(150), "line one line two");
    }

    #[test]
    fn test_page_label() {
        assert_eq!(chunk("x", Some(7)).page_label(), "7");
        assert_eq!(chunk("x", None).page_label(), "unknown");
    }

    #[test]
    fn test_config_validation() {
        assert!(ChunkingConfig::default().validate().is_ok());
        assert!(ChunkingConfig::new(100, 99).validate().is_ok());
        assert!(ChunkingConfig::new(100, 100).validate().is_err());
        assert!(ChunkingConfig::new(0, 0).validate().is_err());
    }
}
