use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Milliseconds in `duration`, or zero when there is nothing to report.
pub fn millis(duration: Option<Duration>) -> f64 {
    match duration {
        Some(d) => d.as_secs_f64() * 1000.0,
        None => 0.0,
    }
}

pub(crate) fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Timing and cache statistics for one batch.
///
/// Batches that skip retrieval report zero hits and zero misses, and zero for
/// every stage they did not run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentationSample {
    pub batch: usize,
    pub batch_size: usize,
    pub encode_ms: f64,
    pub search_ms: f64,
    pub fetch_ms: f64,
    pub hit_count: usize,
    pub miss_count: usize,
    pub avg_embedding_distance: f64,
}

impl InstrumentationSample {
    pub fn new(batch: usize, batch_size: usize) -> Self {
        Self {
            batch,
            batch_size,
            ..Default::default()
        }
    }

    pub fn with_timings(
        mut self,
        encode: Option<Duration>,
        search: Option<Duration>,
        fetch: Option<Duration>,
    ) -> Self {
        self.encode_ms = millis(encode);
        self.search_ms = millis(search);
        self.fetch_ms = millis(fetch);
        self
    }

    pub fn with_counts(mut self, hit_count: usize, miss_count: usize) -> Self {
        self.hit_count = hit_count;
        self.miss_count = miss_count;
        self
    }

    pub fn with_avg_embedding_distance(mut self, distance: f64) -> Self {
        self.avg_embedding_distance = finite_or_zero(distance);
        self
    }

    /// `hits / batch_size`, zero for an empty batch.
    pub fn hit_ratio(&self) -> f64 {
        if self.batch_size == 0 {
            0.0
        } else {
            self.hit_count as f64 / self.batch_size as f64
        }
    }

    /// Whether the cache answered more queries than the index in this batch.
    pub fn mostly_hits(&self) -> bool {
        self.hit_count > self.miss_count
    }
}
