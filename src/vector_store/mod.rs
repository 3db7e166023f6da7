pub(crate) mod base;
pub(crate) mod local;

pub use base::{ExactIndex, IndexSearchResult};
pub use local::FlatIndex;
