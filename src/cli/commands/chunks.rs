//! Chunks command: preview how a document is split, without calling any API.

use crate::chunking::{Chunker, ChunkingConfig, RecursiveChunker};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::document::load_document;
use anyhow::Result;
use console::style;

/// Run the chunks command.
pub async fn run_chunks(
    document: Option<String>,
    max_chunk_size: Option<usize>,
    overlap: Option<usize>,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Chunks)?;

    let path = settings.document_path(document.as_deref())?;
    let config = ChunkingConfig::new(
        max_chunk_size.unwrap_or(settings.chunking.max_chunk_size),
        overlap.unwrap_or(settings.chunking.overlap_size),
    );
    let chunker = RecursiveChunker::new(config)?;

    let document = load_document(&path).await?;
    let chunks = chunker.split(&document);

    Output::header(&format!("{} chunks from {}", chunks.len(), document.source));
    Output::kv("Pages", &document.pages.len().to_string());
    Output::kv("Characters", &document.char_count().to_string());
    Output::kv(
        "Words",
        &document.text().split_whitespace().count().to_string(),
    );
    Output::kv(
        "Chunk size / overlap",
        &format!("{} / {}", config.max_chunk_size, config.overlap_size),
    );

    let preview_chars = settings.session.preview_chars;
    for chunk in &chunks {
        println!(
            "\n{} page {} ({} chars, {} overlap)",
            style(format!("#{}", chunk.sequence_index)).bold(),
            style(chunk.page_label()).cyan(),
            chunk.char_len(),
            chunk.overlap_with_previous
        );
        println!("   {}", chunk.preview(preview_chars));
    }

    if chunks.is_empty() {
        Output::warning("Document has no text to chunk.");
    }

    Ok(())
}
