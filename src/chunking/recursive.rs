//! Separator-aware character chunking.
//!
//! Each page is walked with a window of `max_chunk_size` characters. The
//! window is cut at the last paragraph break inside it, falling back to line
//! breaks, sentence ends, whitespace and finally a hard cut. The next window
//! starts `overlap_size` characters before the previous cut.

use super::{Chunk, Chunker, ChunkingConfig};
use crate::document::{Document, Page};
use crate::error::{PagewiseError, Result};
use regex::Regex;
use tracing::debug;

/// Break candidates in priority order.
const SEPARATORS: &[(&str, &str)] = &[
    ("paragraph", r"\n\n+"),
    ("line", r"\n"),
    ("sentence", r"[.!?]\s"),
    ("whitespace", r"\s"),
];

struct Separator {
    name: &'static str,
    pattern: Regex,
}

/// Chunker that prefers the largest semantic boundary that fits.
pub struct RecursiveChunker {
    config: ChunkingConfig,
    separators: Vec<Separator>,
}

impl RecursiveChunker {
    /// Create a chunker, rejecting an overlap that is not smaller than the chunk size.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;

        let separators = SEPARATORS
            .iter()
            .map(|&(name, pattern)| {
                Regex::new(pattern)
                    .map(|pattern| Separator { name, pattern })
                    .map_err(|e| PagewiseError::Config(format!("Invalid separator {}: {}", name, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { config, separators })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Compute chunk spans for one page as `(start, end)` char offsets.
    fn page_spans(&self, text: &str) -> Vec<(usize, usize)> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let char_starts: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        let total = char_starts.len();
        let max = self.config.max_chunk_size;
        let overlap = self.config.overlap_size;

        if total <= max {
            return vec![(0, total)];
        }

        // Break positions (char offset just past each separator) per separator.
        let boundaries: Vec<Vec<usize>> = self
            .separators
            .iter()
            .map(|sep| {
                sep.pattern
                    .find_iter(text)
                    .map(|m| char_starts.partition_point(|&b| b < m.end()))
                    .collect()
            })
            .collect();

        // A cut must leave the chunk longer than the overlap so the walk advances.
        let min_len = (overlap + 1).max(max / 2);

        let mut spans = Vec::new();
        let mut start = 0;
        loop {
            if total - start <= max {
                spans.push((start, total));
                break;
            }

            let limit = start + max;
            let earliest = start + min_len;
            let end = self
                .separators
                .iter()
                .zip(&boundaries)
                .find_map(|(sep, positions)| {
                    let cut = last_in_range(positions, earliest, limit)?;
                    debug!("Cutting at {} boundary ({})", sep.name, cut);
                    Some(cut)
                })
                .unwrap_or(limit);

            spans.push((start, end));
            start = end - overlap;
        }

        spans
    }

    fn split_page(&self, page: &Page, next_index: &mut usize, chunks: &mut Vec<Chunk>) {
        let text = page.text.as_str();
        let char_starts: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        let byte_at = |c: usize| char_starts.get(c).copied().unwrap_or(text.len());

        for (i, (start, end)) in self.page_spans(text).into_iter().enumerate() {
            chunks.push(Chunk {
                text: text[byte_at(start)..byte_at(end)].to_string(),
                source_page: page.number,
                sequence_index: *next_index,
                overlap_with_previous: if i == 0 { 0 } else { self.config.overlap_size },
                start_char: start,
            });
            *next_index += 1;
        }
    }
}

/// Last position in sorted `positions` within `[earliest, limit]`.
fn last_in_range(positions: &[usize], earliest: usize, limit: usize) -> Option<usize> {
    let idx = positions.partition_point(|&p| p <= limit);
    positions[..idx].last().copied().filter(|&p| p >= earliest)
}

impl Chunker for RecursiveChunker {
    fn split(&self, document: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut next_index = 0;

        for page in &document.pages {
            self.split_page(page, &mut next_index, &mut chunks);
        }

        debug!(
            "Split {} pages of {} into {} chunks",
            document.pages.len(),
            document.source,
            chunks.len()
        );
        chunks
    }
}
