use std::{fmt::Debug, sync::Arc};

use anyhow::bail;
use async_trait::async_trait;

use super::{
    encoder::Encoder,
    generator::{GenerationMode, GenerationOutput, Generator},
};
use crate::{utils::BoxFuture, value::Embedding};

pub type CustomEncoderFunc =
    dyn Fn(Vec<String>) -> BoxFuture<'static, anyhow::Result<Vec<Embedding>>> + Send + Sync;

pub type CustomGeneratorFunc = dyn Fn(String, GenerationMode) -> BoxFuture<'static, anyhow::Result<GenerationOutput>>
    + Send
    + Sync;

/// An [`Encoder`] backed by a caller-supplied function.
#[derive(Clone)]
pub struct CustomEncoder {
    f: Arc<CustomEncoderFunc>,
}

impl Debug for CustomEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomEncoder")
            .field("f", &"function")
            .finish()
    }
}

impl CustomEncoder {
    pub fn new(f: Arc<CustomEncoderFunc>) -> Self {
        Self { f }
    }
}

#[async_trait]
impl Encoder for CustomEncoder {
    async fn encode(&self, texts: Vec<String>) -> anyhow::Result<Vec<Embedding>> {
        (self.f)(texts).await
    }
}

/// A [`Generator`] backed by one function that handles both generation modes.
#[derive(Clone)]
pub struct CustomGenerator {
    f: Arc<CustomGeneratorFunc>,
}

impl Debug for CustomGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomGenerator")
            .field("f", &"function")
            .finish()
    }
}

impl CustomGenerator {
    pub fn new(f: Arc<CustomGeneratorFunc>) -> Self {
        Self { f }
    }
}

#[async_trait]
impl Generator for CustomGenerator {
    async fn generate(&self, prompt: String) -> anyhow::Result<String> {
        match (self.f)(prompt, GenerationMode::Text).await? {
            GenerationOutput::Text(text) => Ok(text),
            GenerationOutput::TopTokens(_) => bail!("expected generated text, got token candidates"),
        }
    }

    async fn top_k_tokens(&self, prompt: String, k: usize) -> anyhow::Result<Vec<String>> {
        match (self.f)(prompt, GenerationMode::TopTokens { k }).await? {
            GenerationOutput::TopTokens(tokens) => Ok(tokens),
            GenerationOutput::Text(_) => bail!("expected token candidates, got generated text"),
        }
    }

    async fn respond(&self, prompt: String, mode: GenerationMode) -> anyhow::Result<GenerationOutput> {
        let output = (self.f)(prompt, mode).await?;
        match (mode, &output) {
            (GenerationMode::Text, GenerationOutput::Text(_))
            | (GenerationMode::TopTokens { .. }, GenerationOutput::TopTokens(_)) => Ok(output),
            _ => bail!("generator returned output of the wrong kind for {:?}", mode),
        }
    }
}
