//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! Retrieval and generation are separate seams: the [`Retriever`] finds
//! supporting chunks, a [`Generator`] writes the answer from them.

pub mod context;
mod generator;
mod retriever;

pub use context::{format_context_for_prompt, format_sources_for_display};
pub use generator::{Generator, OpenAIGenerator};
pub use retriever::{retrieve, Retriever, DEFAULT_TOP_K};

use crate::chunking::Chunk;
use crate::vector_store::SearchResult;
use std::sync::Arc;

/// A generated answer with the chunks it was based on.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The question that was asked.
    pub question: String,
    /// The generated answer.
    pub text: String,
    /// Retrieved chunks used as evidence, best match first.
    pub sources: Vec<SearchResult>,
}

impl Answer {
    /// Supporting chunks in retrieval order.
    pub fn supporting_chunks(&self) -> Vec<Arc<Chunk>> {
        self.sources.iter().map(|s| Arc::clone(&s.chunk)).collect()
    }

    /// Format the answer and its sources for display.
    pub fn format_for_display(&self, preview_chars: usize) -> String {
        let mut output = self.text.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\nSources:\n");
            output.push_str(&format_sources_for_display(&self.sources, preview_chars));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_for_display() {
        let chunk = Arc::new(Chunk {
            text: "Paris is the capital of France.".to_string(),
            source_page: Some(2),
            sequence_index: 4,
            overlap_with_previous: 0,
            start_char: 0,
        });
        let answer = Answer {
            question: "What is the capital of France?".to_string(),
            text: "Paris.".to_string(),
            sources: vec![SearchResult {
                chunk: Arc::clone(&chunk),
                score: 0.91,
            }],
        };

        let shown = answer.format_for_display(150);
        assert!(shown.starts_with("Paris.\n\nSources:\n"));
        assert!(shown.contains("Page: 2"));
        assert!(Arc::ptr_eq(&answer.supporting_chunks()[0], &chunk));
    }

    #[test]
    fn test_no_sources_section_when_empty() {
        let answer = Answer {
            question: "q".to_string(),
            text: "I don't know.".to_string(),
            sources: Vec::new(),
        };
        assert_eq!(answer.format_for_display(150), "I don't know.");
    }
}
