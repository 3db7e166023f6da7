use serde::{Deserialize, Serialize};

use super::{InstrumentationSample, sample::finite_or_zero};

/// Run-level aggregate of every recorded [`InstrumentationSample`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentationSummary {
    pub batches: usize,
    pub queries: usize,
    pub hits: usize,
    pub misses: usize,
    pub hit_rate: f64,
    pub mean_encode_ms: f64,
    pub mean_search_ms: f64,
    pub mean_fetch_ms: f64,
    pub mean_embedding_distance: f64,
}

/// Accumulates per-batch samples for as long as it lives.
///
/// Nothing here can fail: non-finite measurements are stored as zero and
/// every mean over zero samples is zero.
#[derive(Clone, Debug, Default)]
pub struct InstrumentationRecorder {
    samples: Vec<InstrumentationSample>,
    hits: usize,
    misses: usize,
    queries: usize,
}

impl InstrumentationRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, mut sample: InstrumentationSample) {
        sample.encode_ms = finite_or_zero(sample.encode_ms);
        sample.search_ms = finite_or_zero(sample.search_ms);
        sample.fetch_ms = finite_or_zero(sample.fetch_ms);
        sample.avg_embedding_distance = finite_or_zero(sample.avg_embedding_distance);

        self.hits += sample.hit_count;
        self.misses += sample.miss_count;
        self.queries += sample.batch_size;
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[InstrumentationSample] {
        &self.samples
    }

    pub fn total_hits(&self) -> usize {
        self.hits
    }

    pub fn total_misses(&self) -> usize {
        self.misses
    }

    /// Cumulative hits over cumulative queries that went through the cache.
    pub fn hit_rate(&self) -> f64 {
        let resolved = self.hits + self.misses;
        if resolved == 0 {
            0.0
        } else {
            self.hits as f64 / resolved as f64
        }
    }

    fn mean(&self, f: impl Fn(&InstrumentationSample) -> f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(f).sum::<f64>() / self.samples.len() as f64
    }

    pub fn mean_encode_ms(&self) -> f64 {
        self.mean(|s| s.encode_ms)
    }

    pub fn mean_search_ms(&self) -> f64 {
        self.mean(|s| s.search_ms)
    }

    pub fn mean_fetch_ms(&self) -> f64 {
        self.mean(|s| s.fetch_ms)
    }

    pub fn mean_embedding_distance(&self) -> f64 {
        self.mean(|s| s.avg_embedding_distance)
    }

    pub fn summary(&self) -> InstrumentationSummary {
        InstrumentationSummary {
            batches: self.samples.len(),
            queries: self.queries,
            hits: self.hits,
            misses: self.misses,
            hit_rate: self.hit_rate(),
            mean_encode_ms: self.mean_encode_ms(),
            mean_search_ms: self.mean_search_ms(),
            mean_fetch_ms: self.mean_fetch_ms(),
            mean_embedding_distance: self.mean_embedding_distance(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
