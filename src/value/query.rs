use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A question to answer, plus whatever the dataset attached to it.
///
/// `metadata` is opaque to the pipeline; prompt templates may read it
/// through the `record` variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub id: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, serde_json::Value>,
}

impl QueryRecord {
    pub fn new(id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            metadata: IndexMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
