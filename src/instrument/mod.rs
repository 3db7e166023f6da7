mod recorder;
mod sample;

pub use recorder::*;
pub use sample::*;
