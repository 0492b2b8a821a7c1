//! Formatting of retrieved chunks for prompts and for display.

use crate::chunking::Chunk;
use crate::vector_store::SearchResult;
use std::sync::Arc;

/// Format supporting chunks for the generation prompt.
pub fn format_context_for_prompt(chunks: &[Arc<Chunk>]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("[page {}]\n{}", chunk.page_label(), chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format retrieved chunks as a numbered source list for the user.
pub fn format_sources_for_display(sources: &[SearchResult], preview_chars: usize) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            format!(
                "--- (Source {}) ---\nContent: {}\nPage: {} (score: {:.2})",
                i + 1,
                source.chunk.preview(preview_chars),
                source.chunk.page_label(),
                source.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
