use std::collections::VecDeque;

use super::CacheEntry;
use crate::{
    error::ConfigError,
    value::{DistanceMetric, Embedding},
};

/// Slack applied to every comparison, so that `tolerance == 0` still accepts
/// vectors that are equal up to `f32` rounding.
const MATCH_EPSILON: f64 = f32::EPSILON as f64;

/// A bounded key/value store keyed by embeddings.
///
/// # Matching
///
/// A lookup scans the stored entries from oldest to newest and returns the
/// value of the **first** entry whose key lies within `tolerance` of the query
/// under the configured [`DistanceMetric`]. It is not a nearest-neighbor
/// lookup: a later, closer entry is never preferred over an earlier one that
/// already qualifies.
///
/// Lookups never reorder or remove entries.
///
/// # Eviction
///
/// Entries leave in insertion order. When an insert would push the number of
/// stored entries above `capacity`, the oldest entry is dropped first, so
/// [`ApproximateCache::len`] never exceeds [`ApproximateCache::capacity`].
///
/// # Concurrency
///
/// The cache is not synchronized. Mutation goes through `&mut self`, which
/// keeps it single-writer; wrap it yourself if several owners need it.
#[derive(Clone, Debug)]
pub struct ApproximateCache<V> {
    entries: VecDeque<CacheEntry<V>>,
    capacity: usize,
    tolerance: f64,
    metric: DistanceMetric,
    next_order: u64,
}

impl<V> ApproximateCache<V> {
    /// Create an empty cache using Euclidean distance.
    pub fn new(capacity: usize, tolerance: f64) -> Result<Self, ConfigError> {
        Self::with_metric(capacity, tolerance, DistanceMetric::default())
    }

    pub fn with_metric(
        capacity: usize,
        tolerance: f64,
        metric: DistanceMetric,
    ) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::InvalidTolerance(tolerance));
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            tolerance,
            metric,
            next_order: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry<V>> {
        self.entries.iter()
    }

    fn matches(&self, key: &Embedding, query: &Embedding) -> bool {
        self.metric.distance(key, query) <= self.tolerance.max(MATCH_EPSILON)
    }

    /// Value of the first entry within tolerance of `query`, if any.
    pub fn find(&self, query: &Embedding) -> Option<&V> {
        self.entries
            .iter()
            .find(|entry| self.matches(entry.key(), query))
            .map(|entry| entry.value())
    }

    /// Look up every query against the current contents.
    ///
    /// All lookups observe the same state, so a batch can never hit an entry
    /// inserted for one of its own members.
    pub fn find_batch<'a>(&'a self, queries: &[Embedding]) -> Vec<Option<&'a V>> {
        queries.iter().map(|query| self.find(query)).collect()
    }

    /// Store `value` under `key`, evicting the oldest entry if the cache is full.
    pub fn insert(&mut self, key: Embedding, value: V) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        let order = self.next_order;
        self.next_order += 1;
        self.entries.push_back(CacheEntry::new(key, value, order));
    }

    /// Drop every entry. Insertion order keeps counting from where it was.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use yare::parameterized;

    use super::*;

    fn emb(v: &[f32]) -> Embedding {
        v.to_vec().into()
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert_eq!(
            ApproximateCache::<u32>::new(0, 0.1).unwrap_err(),
            ConfigError::InvalidCapacity
        );
        assert!(matches!(
            ApproximateCache::<u32>::new(4, -0.5).unwrap_err(),
            ConfigError::InvalidTolerance(_)
        ));
        assert!(matches!(
            ApproximateCache::<u32>::new(4, f64::NAN).unwrap_err(),
            ConfigError::InvalidTolerance(_)
        ));
    }

    #[test]
    fn empty_cache_never_matches() {
        let cache = ApproximateCache::<u32>::new(2, 100.0).unwrap();
        assert!(cache.find(&emb(&[0.0, 0.0])).is_none());
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut cache = ApproximateCache::new(2, 0.01).unwrap();
        cache.insert(emb(&[0.0, 0.0]), "A");
        cache.insert(emb(&[1.0, 1.0]), "B");

        assert_eq!(cache.find(&emb(&[0.0, 0.005])), Some(&"A"));

        cache.insert(emb(&[2.0, 2.0]), "C");
        assert_eq!(cache.len(), 2);
        assert!(cache.find(&emb(&[0.0, 0.0])).is_none());
        assert_eq!(cache.find(&emb(&[1.0, 1.0])), Some(&"B"));
        assert_eq!(cache.find(&emb(&[2.0, 2.0])), Some(&"C"));
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let mut cache = ApproximateCache::new(3, 0.0).unwrap();
        for i in 0..10 {
            cache.insert(emb(&[i as f32]), i);
            assert!(cache.len() <= 3);
        }
        let orders: Vec<u64> = cache.entries().map(|e| e.insertion_order()).collect();
        assert_eq!(orders, vec![7, 8, 9]);
        let values: Vec<i32> = cache.entries().map(|e| *e.value()).collect();
        assert_eq!(values, vec![7, 8, 9]);
    }

    #[test]
    fn capacity_one_keeps_latest() {
        let mut cache = ApproximateCache::new(1, 0.0).unwrap();
        cache.insert(emb(&[1.0]), 1);
        cache.insert(emb(&[2.0]), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.find(&emb(&[1.0])).is_none());
        assert_eq!(cache.find(&emb(&[2.0])), Some(&2));
    }

    #[test]
    fn returns_first_match_not_nearest() {
        let mut cache = ApproximateCache::new(4, 1.0).unwrap();
        cache.insert(emb(&[0.9, 0.0]), "far");
        cache.insert(emb(&[0.1, 0.0]), "near");
        assert_eq!(cache.find(&emb(&[0.0, 0.0])), Some(&"far"));
    }

    #[test]
    fn lookups_do_not_refresh_entries() {
        let mut cache = ApproximateCache::new(2, 0.0).unwrap();
        cache.insert(emb(&[0.0]), "A");
        cache.insert(emb(&[1.0]), "B");
        // A hit on the oldest entry must not save it from eviction.
        assert_eq!(cache.find(&emb(&[0.0])), Some(&"A"));
        cache.insert(emb(&[2.0]), "C");
        assert!(cache.find(&emb(&[0.0])).is_none());
    }

    #[parameterized(
        exact = { vec![0.5, 0.5], true },
        rounding_noise = { vec![0.5, 0.5 + f32::EPSILON / 4.0], true },
        small_offset = { vec![0.5, 0.501], false },
        other_dimension = { vec![0.5], false },
    )]
    fn zero_tolerance(query: Vec<f32>, hit: bool) {
        let mut cache = ApproximateCache::new(1, 0.0).unwrap();
        cache.insert(emb(&[0.5, 0.5]), ());
        assert_eq!(cache.find(&query.into()).is_some(), hit);
    }

    #[parameterized(
        inside = { 0.2, true },
        on_boundary = { 0.25, true },
        outside = { 0.3, false },
    )]
    fn tolerance_boundary(offset: f32, hit: bool) {
        let mut cache = ApproximateCache::new(1, 0.25).unwrap();
        cache.insert(emb(&[0.0, 0.0]), ());
        assert_eq!(cache.find(&emb(&[offset, 0.0])).is_some(), hit);
    }

    #[test]
    fn cosine_metric_matches_scaled_vectors() {
        let mut cache = ApproximateCache::with_metric(2, 0.01, DistanceMetric::Cosine).unwrap();
        cache.insert(emb(&[1.0, 2.0]), 7);
        assert_eq!(cache.find(&emb(&[2.0, 4.0])), Some(&7));
        assert!(cache.find(&emb(&[2.0, -1.0])).is_none());
    }

    #[test]
    fn find_batch_sees_a_single_snapshot() {
        let mut cache = ApproximateCache::new(4, 0.0).unwrap();
        cache.insert(emb(&[1.0]), 1);
        let found = cache.find_batch(&[emb(&[1.0]), emb(&[2.0]), emb(&[1.0])]);
        assert_eq!(found, vec![Some(&1), None, Some(&1)]);
    }

    #[test]
    fn clear_keeps_counting() {
        let mut cache = ApproximateCache::new(2, 0.0).unwrap();
        cache.insert(emb(&[1.0]), 1);
        cache.insert(emb(&[2.0]), 2);
        cache.clear();
        assert!(cache.is_empty());
        cache.insert(emb(&[3.0]), 3);
        assert_eq!(cache.entries().next().map(|e| e.insertion_order()), Some(2));
    }
}
