use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings of a [`super::BatchPipeline`].
///
/// Every field has a default, so a partial JSON object is a valid config.
/// Unknown keys are rejected:
///
/// ```
/// # use cached_rag::pipeline::PipelineConfig;
/// let config: PipelineConfig = serde_json::from_str(r#"{"batchSize": 8}"#).unwrap();
/// assert_eq!(config.batch_size, 8);
/// assert_eq!(config.capacity, 1024);
/// assert!(serde_json::from_str::<PipelineConfig>(r#"{"batchSise": 8}"#).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
#[builder(default, build_fn(validate = "Self::validate", error = "ConfigError"))]
pub struct PipelineConfig {
    /// Maximum number of cache entries.
    pub capacity: usize,
    /// Maximum distance at which a cached key answers a query.
    pub tolerance: f64,
    /// Neighbors requested from the index for every miss.
    pub top_k: usize,
    pub batch_size: usize,
    /// When false, every query gets the "Not Found" passage and nothing is encoded or searched.
    pub use_retrieval: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            tolerance: 0.0,
            top_k: 10,
            batch_size: 1,
            use_retrieval: true,
        }
    }
}

fn check_capacity(capacity: usize) -> Result<(), ConfigError> {
    if capacity == 0 {
        return Err(ConfigError::InvalidCapacity);
    }
    Ok(())
}

fn check_tolerance(tolerance: f64) -> Result<(), ConfigError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(ConfigError::InvalidTolerance(tolerance));
    }
    Ok(())
}

fn check_top_k(top_k: usize) -> Result<(), ConfigError> {
    if top_k == 0 {
        return Err(ConfigError::InvalidTopK);
    }
    Ok(())
}

fn check_batch_size(batch_size: usize) -> Result<(), ConfigError> {
    if batch_size == 0 {
        return Err(ConfigError::InvalidBatchSize);
    }
    Ok(())
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_capacity(self.capacity)?;
        check_tolerance(self.tolerance)?;
        check_top_k(self.top_k)?;
        check_batch_size(self.batch_size)
    }
}

impl PipelineConfigBuilder {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(capacity) = self.capacity {
            check_capacity(capacity)?;
        }
        if let Some(tolerance) = self.tolerance {
            check_tolerance(tolerance)?;
        }
        if let Some(top_k) = self.top_k {
            check_top_k(top_k)?;
        }
        if let Some(batch_size) = self.batch_size {
            check_batch_size(batch_size)?;
        }
        Ok(())
    }
}
