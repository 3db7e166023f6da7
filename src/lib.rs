//! Retrieval-augmented answering over batches of queries, with an
//! approximate embedding cache in front of the vector index.
//!
//! A [`pipeline::BatchPipeline`] encodes each batch of questions, resolves
//! them through the [`cache::ApproximateCache`] or the
//! [`vector_store::ExactIndex`], fetches passages from a
//! [`knowledge::DocumentStore`], renders prompts and asks a
//! [`model::Generator`] for the answers. Per-batch timings and hit counts are
//! collected by an [`instrument::InstrumentationRecorder`].

pub mod cache;
pub mod error;
pub mod instrument;
pub mod knowledge;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;
pub mod utils;
pub mod value;
pub mod vector_store;

pub use error::{ConfigError, PipelineError, Stage, StageError};
pub use pipeline::{BatchPipeline, BatchProgress, PipelineConfig, PipelineInput, QueryResponse};
