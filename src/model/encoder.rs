use async_trait::async_trait;

use crate::value::Embedding;

/// Turns text into embeddings of a fixed dimensionality.
///
/// Implementations must be deterministic for identical input and model state,
/// and must return exactly one embedding per input text, in input order.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, texts: Vec<String>) -> anyhow::Result<Vec<Embedding>>;
}
