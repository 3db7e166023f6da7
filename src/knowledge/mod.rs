//! Access to the passages that retrieval points at.
//!
//! An [`crate::vector_store::ExactIndex`] only knows document indices. A
//! [`DocumentStore`] turns those indices back into [`crate::value::Passage`]s
//! so they can be placed into a prompt.
mod document_store;

pub use document_store::*;
