pub(crate) mod embedding;
pub(crate) mod passage;
pub(crate) mod query;

pub use embedding::{DistanceMetric, Embedding};
pub use passage::{DocumentIndex, Passage};
pub use query::QueryRecord;
