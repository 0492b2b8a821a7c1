//! Exact in-memory vector index.
//!
//! Queries are a linear scan with cosine similarity. Ties are broken by the
//! chunk's sequence index so results are deterministic.

use super::{cosine_similarity, IndexEntry, SearchResult};
use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{PagewiseError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

/// Append-once collection of embedded chunks.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
    built_at: DateTime<Utc>,
}

impl VectorIndex {
    /// Embed every chunk once and index the results.
    ///
    /// Nothing is returned unless every chunk was embedded with the same
    /// dimensionality.
    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self> {
        if chunks.is_empty() {
            return Err(PagewiseError::IndexBuild(
                "Document produced no chunks to index".to_string(),
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await.map_err(|e| match e {
            PagewiseError::IndexBuild(_) => e,
            other => PagewiseError::IndexBuild(format!("Embedding chunks failed: {}", other)),
        })?;

        let index = Self::from_embeddings(chunks, embeddings)?;
        info!(
            "Indexed {} chunks ({} dimensions)",
            index.len(),
            index.dimensions
        );
        Ok(index)
    }

    /// Index chunks whose embeddings were computed elsewhere.
    pub fn from_embeddings(chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(PagewiseError::IndexBuild(
                "Document produced no chunks to index".to_string(),
            ));
        }
        if embeddings.len() != chunks.len() {
            return Err(PagewiseError::IndexBuild(format!(
                "Got {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = embeddings[0].len();
        if dimensions == 0 {
            return Err(PagewiseError::IndexBuild(
                "Embedder returned an empty vector".to_string(),
            ));
        }

        if let Some((position, bad)) = embeddings
            .iter()
            .enumerate()
            .find(|(_, e)| e.len() != dimensions)
        {
            return Err(PagewiseError::IndexBuild(format!(
                "Embedding {} has {} dimensions, expected {}",
                position,
                bad.len(),
                dimensions
            )));
        }

        if let Some(position) = embeddings
            .iter()
            .position(|e| e.iter().any(|v| !v.is_finite()))
        {
            return Err(PagewiseError::IndexBuild(format!(
                "Embedding {} contains a non-finite value",
                position
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry {
                embedding,
                chunk: Arc::new(chunk),
            })
            .collect();

        Ok(Self {
            entries,
            dimensions,
            built_at: Utc::now(),
        })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimensionality shared by every stored vector.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// When the index was built.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Indexed chunks in insertion order.
    pub fn chunks(&self) -> impl Iterator<Item = &Arc<Chunk>> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// Return the `k` chunks most similar to `vector`, best first.
    ///
    /// Returns every entry when the index holds fewer than `k`.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(PagewiseError::IndexQuery(
                "k must be at least 1".to_string(),
            ));
        }
        if self.entries.is_empty() {
            return Err(PagewiseError::IndexQuery("Index is empty".to_string()));
        }
        if vector.len() != self.dimensions {
            return Err(PagewiseError::IndexQuery(format!(
                "Query vector has {} dimensions, index has {}",
                vector.len(),
                self.dimensions
            )));
        }

        if vector.iter().any(|v| !v.is_finite()) {
            return Err(PagewiseError::IndexQuery(
                "Query vector contains a non-finite value".to_string(),
            ));
        }

        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: Arc::clone(&entry.chunk),
                score: cosine_similarity(vector, &entry.embedding),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.chunk.sequence_index.cmp(&b.chunk.sequence_index))
        });
        results.truncate(k);

        Ok(results)
    }

    /// Like [`VectorIndex::query`], dropping results that score below `min_score`.
    pub fn query_with_threshold(
        &self,
        vector: &[f32],
        k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let mut results = self.query(vector, k)?;
        results.retain(|r| r.score >= min_score);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embedder returning canned vectors keyed by text.
    struct StubEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        batch_calls: AtomicUsize,
    }

    impl StubEmbedder {
        fn new(pairs: &[(&str, Vec<f32>)]) -> Self {
            Self {
                vectors: pairs
                    .iter()
                    .map(|(t, v)| (t.to_string(), v.clone()))
                    .collect(),
                batch_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.vectors
                .get(text)
                .cloned()
                .ok_or_else(|| PagewiseError::Embedding(format!("unknown text {}", text)))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            let mut out = Vec::new();
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    fn chunk(text: &str, sequence_index: usize) -> Chunk {
        Chunk {
            text: text.to_string(),
            source_page: Some(1),
            sequence_index,
            overlap_with_previous: 0,
            start_char: 0,
        }
    }

    fn four_chunk_index() -> VectorIndex {
        VectorIndex::from_embeddings(
            vec![chunk("a", 0), chunk("b", 1), chunk("c", 2), chunk("d", 3)],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.7, 0.7, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_build_embeds_in_one_batch() {
        let embedder = StubEmbedder::new(&[
            ("alpha", vec![1.0, 0.0, 0.0]),
            ("beta", vec![0.0, 1.0, 0.0]),
        ]);

        let index = VectorIndex::build(vec![chunk("alpha", 0), chunk("beta", 1)], &embedder)
            .await
            .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.dimensions(), 3);
        assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 1);
        let texts: Vec<_> = index.chunks().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_build_rejects_empty_chunks() {
        let embedder = StubEmbedder::new(&[]);
        let err = VectorIndex::build(Vec::new(), &embedder).await.unwrap_err();
        assert!(matches!(err, PagewiseError::IndexBuild(_)));
        assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_build_rejects_dimension_mismatch() {
        let embedder = StubEmbedder::new(&[
            ("alpha", vec![1.0, 0.0, 0.0]),
            ("beta", vec![0.0, 1.0]),
        ]);
        let err = VectorIndex::build(vec![chunk("alpha", 0), chunk("beta", 1)], &embedder)
            .await
            .unwrap_err();
        assert!(matches!(err, PagewiseError::IndexBuild(_)));
    }

    #[tokio::test]
    async fn test_build_wraps_embedding_failure() {
        let embedder = StubEmbedder::new(&[("alpha", vec![1.0, 0.0, 0.0])]);
        let err = VectorIndex::build(vec![chunk("alpha", 0), chunk("missing", 1)], &embedder)
            .await
            .unwrap_err();
        assert!(matches!(err, PagewiseError::IndexBuild(_)));
    }

    #[test]
    fn test_from_embeddings_count_mismatch() {
        let err = VectorIndex::from_embeddings(vec![chunk("a", 0)], vec![]).unwrap_err();
        assert!(matches!(err, PagewiseError::IndexBuild(_)));
    }

    #[test]
    fn test_from_embeddings_rejects_nan() {
        let err = VectorIndex::from_embeddings(
            vec![chunk("c0", 0), chunk("c1", 1)],
            vec![vec![1.0, 0.0], vec![f32::NAN, 0.0]],
        )
        .unwrap_err();
        assert!(matches!(err, PagewiseError::IndexBuild(_)));
    }

    #[tokio::test]
    async fn test_build_rejects_infinite_embedding() {
        let embedder = StubEmbedder::new(&[
            ("alpha", vec![1.0, 0.0, 0.0]),
            ("beta", vec![f32::INFINITY, 0.0, 0.0]),
        ]);
        let err = VectorIndex::build(vec![chunk("alpha", 0), chunk("beta", 1)], &embedder)
            .await
            .unwrap_err();
        assert!(matches!(err, PagewiseError::IndexBuild(_)));
    }

    #[test]
    fn test_query_rejects_non_finite_vector() {
        let index = four_chunk_index();
        assert!(matches!(
            index.query(&[f32::NAN, 0.0, 0.0], 2),
            Err(PagewiseError::IndexQuery(_))
        ));
        assert!(matches!(
            index.query_with_threshold(&[0.0, f32::NEG_INFINITY, 0.0], 2, 0.1),
            Err(PagewiseError::IndexQuery(_))
        ));
    }

    #[test]
    fn test_query_returns_all_when_k_exceeds_size() {
        let index = four_chunk_index();
        let results = index.query(&[1.0, 0.2, 0.0], 10).unwrap();

        assert_eq!(results.len(), 4);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(results[0].chunk.text, "a");
    }

    #[test]
    fn test_exact_vector_ranks_first() {
        let index = four_chunk_index();
        let results = index.query(&[0.0, 0.0, 1.0], 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.text, "d");
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ties_prefer_earlier_chunk() {
        let index = VectorIndex::from_embeddings(
            vec![chunk("late", 5), chunk("early", 2), chunk("other", 3)],
            vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap();

        let results = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].chunk.text, "early");
        assert_eq!(results[1].chunk.text, "late");
    }

    #[test]
    fn test_query_errors() {
        let index = four_chunk_index();
        assert!(matches!(
            index.query(&[1.0, 0.0], 2),
            Err(PagewiseError::IndexQuery(_))
        ));
        assert!(matches!(
            index.query(&[1.0, 0.0, 0.0], 0),
            Err(PagewiseError::IndexQuery(_))
        ));
    }

    #[test]
    fn test_results_share_chunks_with_index() {
        let index = four_chunk_index();
        let results = index.query(&[1.0, 0.0, 0.0], 1).unwrap();
        let stored = index.chunks().next().unwrap();
        assert!(Arc::ptr_eq(&results[0].chunk, stored));
    }

    #[test]
    fn test_query_with_threshold() {
        let index = four_chunk_index();
        let results = index.query_with_threshold(&[1.0, 0.0, 0.0], 4, 0.5).unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_concurrent_readers() {
        let index = Arc::new(four_chunk_index());
        let mut handles = Vec::new();
        for i in 0..8 {
            let index = Arc::clone(&index);
            handles.push(tokio::spawn(async move {
                let query = if i % 2 == 0 { [1.0, 0.0, 0.0] } else { [0.0, 1.0, 0.0] };
                index.query(&query, 1).unwrap()[0].chunk.text.clone()
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            let top = handle.await.unwrap();
            assert_eq!(top, if i % 2 == 0 { "a" } else { "b" });
        }
    }

    fn arb_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
        proptest::collection::vec(-1.0f32..1.0f32, dim)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn query_is_ordered_and_bounded(
            embeddings in proptest::collection::vec(arb_embedding(8), 1..20),
            query in arb_embedding(8),
            k in 1usize..25,
        ) {
            let chunks = (0..embeddings.len()).map(|i| chunk(&format!("c{i}"), i)).collect();
            let n = embeddings.len();
            let index = VectorIndex::from_embeddings(chunks, embeddings).unwrap();
            let results = index.query(&query, k).unwrap();

            prop_assert_eq!(results.len(), k.min(n));
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(pair[0].chunk.sequence_index < pair[1].chunk.sequence_index);
                }
            }
        }

        #[test]
        fn built_index_matches_direct_construction(
            embeddings in proptest::collection::vec(arb_embedding(4), 1..10),
        ) {
            let pairs: Vec<(String, Vec<f32>)> = embeddings
                .iter()
                .enumerate()
                .map(|(i, e)| (format!("chunk {i}"), e.clone()))
                .collect();
            let refs: Vec<(&str, Vec<f32>)> =
                pairs.iter().map(|(t, e)| (t.as_str(), e.clone())).collect();
            let embedder = StubEmbedder::new(&refs);
            let chunks: Vec<Chunk> = pairs.iter().enumerate().map(|(i, (t, _))| chunk(t, i)).collect();

            let index = tokio_test::block_on(VectorIndex::build(chunks, &embedder)).unwrap();
            let stored: Vec<Vec<f32>> = index.entries().iter().map(|e| e.embedding.clone()).collect();
            prop_assert_eq!(stored, embeddings);
        }
    }
}
