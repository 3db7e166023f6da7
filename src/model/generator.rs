use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What the pipeline asks the generator for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GenerationMode {
    /// A full generated answer.
    #[default]
    Text,
    /// The `k` most likely next tokens, most likely first.
    TopTokens { k: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum GenerationOutput {
    Text(String),
    TopTokens(Vec<String>),
}

impl GenerationOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            GenerationOutput::Text(text) => Some(text),
            GenerationOutput::TopTokens(_) => None,
        }
    }

    pub fn as_tokens(&self) -> Option<&[String]> {
        match self {
            GenerationOutput::TopTokens(tokens) => Some(tokens),
            GenerationOutput::Text(_) => None,
        }
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: String) -> anyhow::Result<String>;

    /// Ranked next-token candidates for `prompt`, used for probability inspection.
    async fn top_k_tokens(&self, prompt: String, k: usize) -> anyhow::Result<Vec<String>>;

    async fn respond(&self, prompt: String, mode: GenerationMode) -> anyhow::Result<GenerationOutput> {
        match mode {
            GenerationMode::Text => Ok(GenerationOutput::Text(self.generate(prompt).await?)),
            GenerationMode::TopTokens { k } => {
                Ok(GenerationOutput::TopTokens(self.top_k_tokens(prompt, k).await?))
            }
        }
    }
}
