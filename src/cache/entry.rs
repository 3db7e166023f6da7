use crate::value::Embedding;

/// One stored key/value pair of an [`super::ApproximateCache`].
///
/// Entries are never modified after insertion; they only leave the cache
/// through eviction or [`super::ApproximateCache::clear`].
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry<V> {
    key: Embedding,
    value: V,
    insertion_order: u64,
}

impl<V> CacheEntry<V> {
    pub(super) fn new(key: Embedding, value: V, insertion_order: u64) -> Self {
        Self {
            key,
            value,
            insertion_order,
        }
    }

    pub fn key(&self) -> &Embedding {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn insertion_order(&self) -> u64 {
        self.insertion_order
    }
}
