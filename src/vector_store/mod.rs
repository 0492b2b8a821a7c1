//! Vector index over document chunks.
//!
//! The index is built once per document and is read-only afterwards, so it
//! can be shared between sessions behind an `Arc` without locking.

mod index;

pub use index::VectorIndex;

use crate::chunking::Chunk;
use std::sync::Arc;

/// A stored embedding and the chunk it was computed from.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// The embedded chunk.
    pub chunk: Arc<Chunk>,
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk, shared with the index.
    pub chunk: Arc<Chunk>,
    /// Cosine similarity to the query (higher is better).
    pub score: f32,
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
