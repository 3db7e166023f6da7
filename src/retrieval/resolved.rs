use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::value::{DocumentIndex, Passage};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RetrievalSource {
    /// Answered by the approximate cache.
    Hit,
    /// Answered by the exact index.
    Miss,
}

/// Document indices resolved for one query of a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRetrieval {
    pub document_indices: Vec<DocumentIndex>,
    pub source: RetrievalSource,
}

impl ResolvedRetrieval {
    pub fn hit(document_indices: Vec<DocumentIndex>) -> Self {
        Self {
            document_indices,
            source: RetrievalSource::Hit,
        }
    }

    pub fn miss(document_indices: Vec<DocumentIndex>) -> Self {
        Self {
            document_indices,
            source: RetrievalSource::Miss,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.source == RetrievalSource::Hit
    }
}

/// Everything retrieval produced for one batch, in batch order.
#[derive(Clone, Debug)]
pub struct RetrievalOutcome {
    pub resolved: Vec<ResolvedRetrieval>,
    pub passages: Vec<Vec<Passage>>,
    /// Cache lookup plus index search.
    pub search: Duration,
    pub fetch: Duration,
    pub avg_embedding_distance: f64,
}

impl RetrievalOutcome {
    pub fn hit_count(&self) -> usize {
        self.resolved.iter().filter(|r| r.is_hit()).count()
    }

    pub fn miss_count(&self) -> usize {
        self.resolved.len() - self.hit_count()
    }
}
