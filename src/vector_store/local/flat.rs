use anyhow::{bail, ensure};
use async_trait::async_trait;
use ordered_float::OrderedFloat;
use parking_lot::RwLock;

use super::super::base::{ExactIndex, IndexSearchResult};
use crate::value::{DistanceMetric, DocumentIndex, Embedding};

/// Brute-force in-memory index.
///
/// Documents are numbered in insertion order starting at 0, matching the
/// positions of an [`crate::knowledge::InMemoryDocumentStore`] filled in the
/// same order. Equal distances are ranked by document index.
#[derive(Debug)]
pub struct FlatIndex {
    dim: usize,
    metric: DistanceMetric,
    vectors: RwLock<Vec<Embedding>>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self::with_metric(dim, DistanceMetric::default())
    }

    pub fn with_metric(dim: usize, metric: DistanceMetric) -> Self {
        Self {
            dim,
            metric,
            vectors: RwLock::new(Vec::new()),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.read().is_empty()
    }

    pub fn add_vector(&self, embedding: Embedding) -> anyhow::Result<DocumentIndex> {
        Ok(self.add_vectors(vec![embedding])?.start)
    }

    /// Append embeddings, returning the range of indices they were assigned.
    pub fn add_vectors(
        &self,
        embeddings: Vec<Embedding>,
    ) -> anyhow::Result<std::ops::Range<DocumentIndex>> {
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dim) {
            bail!(
                "embedding dimension mismatch: index expects {}, got {}",
                self.dim,
                bad.len()
            );
        }
        let mut vectors = self.vectors.write();
        let start = vectors.len();
        vectors.extend(embeddings);
        Ok(start..vectors.len())
    }

    fn nearest(&self, vectors: &[Embedding], query: &Embedding, k: usize) -> IndexSearchResult {
        let mut scored: Vec<(OrderedFloat<f64>, DocumentIndex)> = vectors
            .iter()
            .enumerate()
            .map(|(idx, v)| (OrderedFloat(self.metric.distance(query, v)), idx))
            .collect();
        scored.sort_unstable();
        scored.truncate(k);

        let (distances, indices) = scored
            .into_iter()
            .map(|(d, idx)| (d.into_inner() as f32, idx))
            .unzip();
        IndexSearchResult { indices, distances }
    }
}

#[async_trait]
impl ExactIndex for FlatIndex {
    async fn search(
        &self,
        queries: &[Embedding],
        k: usize,
    ) -> anyhow::Result<Vec<IndexSearchResult>> {
        for query in queries {
            ensure!(
                query.len() == self.dim,
                "query dimension mismatch: index expects {}, got {}",
                self.dim,
                query.len()
            );
        }
        let vectors = self.vectors.read();
        Ok(queries
            .iter()
            .map(|query| self.nearest(&vectors, query, k))
            .collect())
    }
}
