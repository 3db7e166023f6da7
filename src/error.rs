use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("exactly one of a dataset or an explicit query list must be supplied")]
    InputSource,
    #[error("cache capacity must be at least 1")]
    InvalidCapacity,
    #[error("cache tolerance must be a finite, non-negative number (got {0})")]
    InvalidTolerance(f64),
    #[error("batch size must be at least 1")]
    InvalidBatchSize,
    #[error("top_k must be at least 1")]
    InvalidTopK,
    #[error("missing configuration field: {0}")]
    MissingField(String),
}

impl From<derive_builder::UninitializedFieldError> for ConfigError {
    fn from(value: derive_builder::UninitializedFieldError) -> Self {
        Self::MissingField(value.field_name().to_owned())
    }
}

/// The step of a batch that produced a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Encode,
    Search,
    Fetch,
    Prompt,
    Generate,
}

/// A failure of one stage, before the pipeline attaches the batch index.
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: anyhow::Error,
}

impl StageError {
    pub fn new(stage: Stage, source: impl Into<anyhow::Error>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    pub(crate) fn at_batch(self, batch: usize) -> PipelineError {
        PipelineError::Batch {
            batch,
            stage: self.stage,
            source: self.source,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("batch {batch} failed at the {stage} stage: {source}")]
    Batch {
        batch: usize,
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    /// Index of the batch that failed, if the failure happened while running.
    pub fn batch(&self) -> Option<usize> {
        match self {
            PipelineError::Batch { batch, .. } => Some(*batch),
            PipelineError::Configuration(_) => None,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Batch { stage, .. } => Some(*stage),
            PipelineError::Configuration(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_carries_batch_index() {
        let err = StageError::new(Stage::Search, anyhow::anyhow!("index offline")).at_batch(3);
        assert_eq!(err.batch(), Some(3));
        assert_eq!(err.stage(), Some(Stage::Search));
        assert_eq!(
            err.to_string(),
            "batch 3 failed at the search stage: index offline"
        );
    }

    #[test]
    fn configuration_error_has_no_batch() {
        let err = PipelineError::from(ConfigError::InputSource);
        assert_eq!(err.batch(), None);
        assert_eq!(err.stage(), None);
    }
}
