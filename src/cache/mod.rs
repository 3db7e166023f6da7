pub(crate) mod approximate;
pub(crate) mod entry;

pub use approximate::*;
pub use entry::*;
