use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::value::{DocumentIndex, Embedding};

/// Nearest neighbors of one query, closest first.
///
/// `indices` and `distances` have the same length.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSearchResult {
    pub indices: Vec<DocumentIndex>,
    pub distances: Vec<f32>,
}

impl IndexSearchResult {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A vector similarity index searched by exact (or index-defined) nearest-neighbor lookup.
#[async_trait]
pub trait ExactIndex: Send + Sync {
    /// Search the `k` nearest documents for every query.
    ///
    /// Must return one result per query, in query order.
    async fn search(&self, queries: &[Embedding], k: usize)
    -> anyhow::Result<Vec<IndexSearchResult>>;
}
