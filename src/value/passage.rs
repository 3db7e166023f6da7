use serde::{Deserialize, Serialize};

/// Position of a passage inside a document collection.
pub type DocumentIndex = usize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub title: String,
    pub text: String,
}

impl Passage {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }

    /// Placeholder paired with every query when retrieval is turned off.
    pub fn not_found() -> Self {
        Self::new("Not Found", "No corresponding source was found.")
    }
}
