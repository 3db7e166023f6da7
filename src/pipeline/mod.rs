mod config;
mod input;
mod runner;

pub use config::*;
pub use input::*;
pub use runner::*;
