use anyhow::Context as _;
use async_trait::async_trait;

use crate::value::{DocumentIndex, Passage};

/// Maps document indices to passages.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> String;

    /// Passages for `indices`, in the same order.
    ///
    /// Fails if any index cannot be resolved; no placeholder is substituted.
    async fn get_passages(&self, indices: &[DocumentIndex]) -> anyhow::Result<Vec<Passage>>;
}

/// A named, read-only collection held in memory.
#[derive(Clone, Debug)]
pub struct InMemoryDocumentStore {
    name: String,
    passages: Vec<Passage>,
}

impl InMemoryDocumentStore {
    pub fn new(name: impl Into<String>, passages: impl IntoIterator<Item = Passage>) -> Self {
        Self {
            name: name.into(),
            passages: passages.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn get_passages(&self, indices: &[DocumentIndex]) -> anyhow::Result<Vec<Passage>> {
        indices
            .iter()
            .map(|&idx| {
                self.passages.get(idx).cloned().with_context(|| {
                    format!(
                        "document {} not found in collection \"{}\" ({} passages)",
                        idx,
                        self.name,
                        self.passages.len()
                    )
                })
            })
            .collect()
    }
}
