//! Query-time retrieval over a built index.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{SearchResult, VectorIndex};
use std::sync::Arc;
use tracing::debug;

/// Number of chunks retrieved when the caller does not say otherwise.
pub const DEFAULT_TOP_K: usize = 4;

/// Embed `question` and return the `k` closest chunks in `index`.
///
/// `embedder` must be the embedder the index was built with. A different
/// embedder is only caught if its dimensionality differs, in which case the
/// index reports a query error.
pub async fn retrieve(
    question: &str,
    embedder: &dyn Embedder,
    index: &VectorIndex,
    k: usize,
) -> Result<Vec<SearchResult>> {
    let query_embedding = embedder.embed(question).await?;
    index.query(&query_embedding, k)
}

/// Retrieves supporting chunks for questions.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<VectorIndex>,
    top_k: usize,
    min_score: Option<f32>,
}

impl Retriever {
    /// Create a new retriever.
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            top_k: DEFAULT_TOP_K,
            min_score: None,
        }
    }

    /// Set the number of chunks returned per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Retrieve chunks for a question, best match first.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(question).await?;

        let results = match self.min_score {
            Some(min_score) => {
                self.index
                    .query_with_threshold(&query_embedding, self.top_k, min_score)?
            }
            None => self.index.query(&query_embedding, self.top_k)?,
        };

        debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }
}
