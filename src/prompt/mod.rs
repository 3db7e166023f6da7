mod history;
mod template;

pub use history::*;
pub use template::*;
