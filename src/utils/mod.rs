pub mod log;
pub(crate) mod maybe_sync;

pub use maybe_sync::*;
