use crate::{error::ConfigError, value::QueryRecord};

/// The queries of one pipeline run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineInput {
    records: Vec<QueryRecord>,
}

impl PipelineInput {
    /// Accepts either a dataset or a list of plain questions, never both.
    ///
    /// Plain questions are numbered `"0"`, `"1"`, ... in the order given.
    pub fn new(
        dataset: Option<Vec<QueryRecord>>,
        queries: Option<Vec<String>>,
    ) -> Result<Self, ConfigError> {
        match (dataset, queries) {
            (Some(records), None) => Ok(Self::from_dataset(records)),
            (None, Some(queries)) => Ok(Self::from_queries(queries)),
            _ => Err(ConfigError::InputSource),
        }
    }

    pub fn from_dataset(records: impl IntoIterator<Item = QueryRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    pub fn from_queries(queries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            records: queries
                .into_iter()
                .enumerate()
                .map(|(i, q)| QueryRecord::new(i.to_string(), q))
                .collect(),
        }
    }

    pub fn records(&self) -> &[QueryRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<QueryRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_source() {
        assert_eq!(
            PipelineInput::new(None, None).unwrap_err(),
            ConfigError::InputSource
        );
        assert_eq!(
            PipelineInput::new(Some(vec![]), Some(vec![])).unwrap_err(),
            ConfigError::InputSource
        );
    }

    #[test]
    fn plain_queries_are_numbered() -> anyhow::Result<()> {
        let input = PipelineInput::new(None, Some(vec!["first?".into(), "second?".into()]))?;
        let ids: Vec<_> = input.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1"]);
        assert_eq!(input.records()[1].question, "second?");
        Ok(())
    }

    #[test]
    fn dataset_is_kept_as_is() -> anyhow::Result<()> {
        let record = QueryRecord::new("q-17", "Why?");
        let input = PipelineInput::new(Some(vec![record.clone()]), None)?;
        assert_eq!(input.into_records(), vec![record]);
        Ok(())
    }
}
