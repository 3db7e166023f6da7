use std::{sync::Arc, time::Instant};

use anyhow::{Context as _, anyhow};
use futures::future::try_join_all;

use super::{ResolvedRetrieval, RetrievalOutcome};
use crate::{
    cache::ApproximateCache,
    error::{Stage, StageError},
    knowledge::DocumentStore,
    model::Encoder,
    utils::log,
    value::{DocumentIndex, Embedding, Passage},
    vector_store::ExactIndex,
};

/// Resolves a batch of query embeddings to passages, consulting the
/// approximate cache before the exact index.
///
/// The orchestrator is the only writer of its cache. Within one call to
/// [`RetrievalOrchestrator::resolve`] every lookup happens before any insert,
/// so two equal novel queries in the same batch are both misses.
pub struct RetrievalOrchestrator {
    cache: ApproximateCache<Vec<DocumentIndex>>,
    index: Arc<dyn ExactIndex>,
    documents: Arc<dyn DocumentStore>,
    encoder: Arc<dyn Encoder>,
    top_k: usize,
}

impl RetrievalOrchestrator {
    pub fn new(
        cache: ApproximateCache<Vec<DocumentIndex>>,
        index: Arc<dyn ExactIndex>,
        documents: Arc<dyn DocumentStore>,
        encoder: Arc<dyn Encoder>,
        top_k: usize,
    ) -> Self {
        Self {
            cache,
            index,
            documents,
            encoder,
            top_k,
        }
    }

    pub fn cache(&self) -> &ApproximateCache<Vec<DocumentIndex>> {
        &self.cache
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Document indices for every query, in query order.
    ///
    /// Misses go to the index in a single call and are then inserted into the
    /// cache in batch order. Empty index results are returned but not cached.
    /// If the index fails, or answers with the wrong number of results, the
    /// cache is left untouched.
    pub async fn resolve(
        &mut self,
        queries: &[Embedding],
    ) -> Result<Vec<ResolvedRetrieval>, StageError> {
        let cached: Vec<Option<Vec<DocumentIndex>>> = self
            .cache
            .find_batch(queries)
            .into_iter()
            .map(|hit| hit.filter(|indices| !indices.is_empty()).cloned())
            .collect();

        let miss_vectors: Vec<Embedding> = queries
            .iter()
            .zip(&cached)
            .filter(|(_, hit)| hit.is_none())
            .map(|(query, _)| query.clone())
            .collect();

        let fresh = if miss_vectors.is_empty() {
            Vec::new()
        } else {
            let results = self
                .index
                .search(&miss_vectors, self.top_k)
                .await
                .map_err(|e| StageError::new(Stage::Search, e))?;
            if results.len() != miss_vectors.len() {
                return Err(StageError::new(
                    Stage::Search,
                    anyhow!(
                        "index returned {} results for {} queries",
                        results.len(),
                        miss_vectors.len()
                    ),
                ));
            }
            results
        };

        log::debug(format!(
            "cache resolved {} of {} queries ({} entries stored)",
            queries.len() - miss_vectors.len(),
            queries.len(),
            self.cache.len()
        ));

        let mut fresh_indices = Vec::with_capacity(fresh.len());
        for (vector, result) in miss_vectors.into_iter().zip(fresh) {
            if !result.is_empty() {
                self.cache.insert(vector, result.indices.clone());
            }
            fresh_indices.push(result.indices);
        }

        let mut fresh_indices = fresh_indices.into_iter();
        Ok(cached
            .into_iter()
            .map(|hit| match hit {
                Some(indices) => ResolvedRetrieval::hit(indices),
                // One fresh result exists per miss, checked above.
                None => ResolvedRetrieval::miss(fresh_indices.next().unwrap_or_default()),
            })
            .collect())
    }

    /// Passages for every resolved query, fetched concurrently.
    pub async fn fetch(
        &self,
        resolved: &[ResolvedRetrieval],
    ) -> Result<Vec<Vec<Passage>>, StageError> {
        try_join_all(
            resolved
                .iter()
                .map(|r| self.documents.get_passages(&r.document_indices)),
        )
        .await
        .with_context(|| format!("fetching passages from \"{}\"", self.documents.name()))
        .map_err(|e| StageError::new(Stage::Fetch, e))
    }

    /// Mean Euclidean distance between each query and the embeddings of its
    /// fetched passages, over all passages of the batch.
    ///
    /// Passage texts are encoded in one call. Zero when there are no passages.
    pub async fn embedding_distance(
        &self,
        queries: &[Embedding],
        passages: &[Vec<Passage>],
    ) -> Result<f64, StageError> {
        let texts: Vec<String> = passages.iter().flatten().map(|p| p.text.clone()).collect();
        if texts.is_empty() {
            return Ok(0.0);
        }
        let expected = texts.len();
        let encoded = self
            .encoder
            .encode(texts)
            .await
            .map_err(|e| StageError::new(Stage::Encode, e))?;
        if encoded.len() != expected {
            return Err(StageError::new(
                Stage::Encode,
                anyhow!(
                    "encoder returned {} embeddings for {} passages",
                    encoded.len(),
                    expected
                ),
            ));
        }

        let mut encoded = encoded.iter();
        let mut total = 0.0;
        for (query, group) in queries.iter().zip(passages) {
            for passage_vector in encoded.by_ref().take(group.len()) {
                total += passage_vector.euclidean_distance(query);
            }
        }
        Ok(total / expected as f64)
    }

    pub async fn retrieve(&mut self, queries: &[Embedding]) -> Result<RetrievalOutcome, StageError> {
        let started = Instant::now();
        let resolved = self.resolve(queries).await?;
        let search = started.elapsed();

        let started = Instant::now();
        let passages = self.fetch(&resolved).await?;
        let fetch = started.elapsed();

        let avg_embedding_distance = self.embedding_distance(queries, &passages).await?;

        Ok(RetrievalOutcome {
            resolved,
            passages,
            search,
            fetch,
            avg_embedding_distance,
        })
    }
}
