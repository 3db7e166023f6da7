mod orchestrator;
mod resolved;

pub use orchestrator::*;
pub use resolved::*;
