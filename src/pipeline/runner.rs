use std::{sync::Arc, time::Instant};

use anyhow::anyhow;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::{PipelineConfig, PipelineInput};
use crate::{
    cache::ApproximateCache,
    error::{ConfigError, PipelineError, Stage, StageError},
    instrument::{InstrumentationRecorder, InstrumentationSample},
    knowledge::DocumentStore,
    model::{Encoder, GenerationMode, GenerationOutput, Generator},
    prompt::PromptBuilder,
    retrieval::RetrievalOrchestrator,
    utils::{BoxStream, log},
    value::{Embedding, Passage, QueryRecord},
    vector_store::ExactIndex,
};

/// The generator's answer to one query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: QueryRecord,
    pub output: GenerationOutput,
}

/// Emitted by [`BatchPipeline::run_stream`] once a batch is complete.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub batch: usize,
    pub total_batches: usize,
    pub responses: Vec<QueryResponse>,
    pub sample: InstrumentationSample,
}

/// Runs queries through encode, retrieval, prompt building and generation,
/// one batch at a time.
///
/// Batches run strictly in order, so cache entries added by one batch are
/// visible to the next. The cache and the instrumentation live as long as the
/// pipeline; calling [`BatchPipeline::run`] again reuses both.
///
/// # Public APIs
/// - `run_stream`: yields a [`BatchProgress`] per batch
/// - `run`: returns every [`QueryResponse`] in input order
///
/// A failing batch ends the run with a [`PipelineError`] naming the batch and
/// the stage. Batches before it have already been recorded. The failing batch
/// is not recorded, but cache entries it inserted before the failure (its
/// resolved misses, when fetch, prompt or generation fails) stay in the cache.
pub struct BatchPipeline {
    config: PipelineConfig,
    encoder: Arc<dyn Encoder>,
    retrieval: RetrievalOrchestrator,
    prompt_builder: Arc<dyn PromptBuilder>,
    generator: Arc<dyn Generator>,
    recorder: InstrumentationRecorder,
}

impl BatchPipeline {
    pub fn new(
        config: PipelineConfig,
        encoder: Arc<dyn Encoder>,
        index: Arc<dyn ExactIndex>,
        documents: Arc<dyn DocumentStore>,
        prompt_builder: Arc<dyn PromptBuilder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let cache = ApproximateCache::new(config.capacity, config.tolerance)?;
        let retrieval =
            RetrievalOrchestrator::new(cache, index, documents, encoder.clone(), config.top_k);
        Ok(Self {
            config,
            encoder,
            retrieval,
            prompt_builder,
            generator,
            recorder: InstrumentationRecorder::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn retrieval(&self) -> &RetrievalOrchestrator {
        &self.retrieval
    }

    pub fn recorder(&self) -> &InstrumentationRecorder {
        &self.recorder
    }

    pub fn reset_instrumentation(&mut self) {
        self.recorder.reset();
    }

    async fn encode(&self, batch: &[QueryRecord]) -> Result<Vec<Embedding>, StageError> {
        let texts = batch.iter().map(|q| q.question.clone()).collect();
        let embeddings = self
            .encoder
            .encode(texts)
            .await
            .map_err(|e| StageError::new(Stage::Encode, e))?;
        if embeddings.len() != batch.len() {
            return Err(StageError::new(
                Stage::Encode,
                anyhow!(
                    "encoder returned {} embeddings for {} queries",
                    embeddings.len(),
                    batch.len()
                ),
            ));
        }
        Ok(embeddings)
    }

    async fn run_batch(
        &mut self,
        index: usize,
        batch: &[QueryRecord],
        mode: GenerationMode,
    ) -> Result<(Vec<QueryResponse>, InstrumentationSample), StageError> {
        let mut sample = InstrumentationSample::new(index, batch.len());

        let passages: Vec<Vec<Passage>> = if self.config.use_retrieval {
            let started = Instant::now();
            let embeddings = self.encode(batch).await?;
            let encode = started.elapsed();

            let outcome = self.retrieval.retrieve(&embeddings).await?;
            sample = sample
                .with_timings(Some(encode), Some(outcome.search), Some(outcome.fetch))
                .with_counts(outcome.hit_count(), outcome.miss_count())
                .with_avg_embedding_distance(outcome.avg_embedding_distance);
            outcome.passages
        } else {
            vec![vec![Passage::not_found()]; batch.len()]
        };

        let prompts = batch
            .iter()
            .zip(&passages)
            .map(|(query, passages)| self.prompt_builder.build(query, passages))
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(|e| StageError::new(Stage::Prompt, e))?;

        let mut responses = Vec::with_capacity(batch.len());
        for (query, prompt) in batch.iter().zip(prompts) {
            let output = self
                .generator
                .respond(prompt, mode)
                .await
                .map_err(|e| StageError::new(Stage::Generate, e))?;
            responses.push(QueryResponse {
                query: query.clone(),
                output,
            });
        }

        log::debug(format!(
            "batch {}: {} queries, {} hits, {} misses, encode {:.2}ms, search {:.2}ms, fetch {:.2}ms",
            index,
            sample.batch_size,
            sample.hit_count,
            sample.miss_count,
            sample.encode_ms,
            sample.search_ms,
            sample.fetch_ms
        ));
        self.recorder.record(sample.clone());
        Ok((responses, sample))
    }

    pub fn run_stream<'a>(
        &'a mut self,
        input: PipelineInput,
        mode: GenerationMode,
    ) -> BoxStream<'a, Result<BatchProgress, PipelineError>> {
        let records = input.into_records();
        let batch_size = self.config.batch_size;
        let total_batches = records.len().div_ceil(batch_size);
        let strm = async_stream::try_stream! {
            log::info(format!(
                "running {} queries in {} batches (retrieval {})",
                records.len(),
                total_batches,
                if self.config.use_retrieval { "on" } else { "off" }
            ));
            for (batch, chunk) in records.chunks(batch_size).enumerate() {
                let (responses, sample) = self
                    .run_batch(batch, chunk, mode)
                    .await
                    .map_err(|e| {
                        let err = e.at_batch(batch);
                        log::warn(format!("{}", err));
                        err
                    })?;
                yield BatchProgress {
                    batch,
                    total_batches,
                    responses,
                    sample,
                };
            }
            log::info(format!(
                "run finished, cumulative hit rate {:.3}",
                self.recorder.hit_rate()
            ));
        };
        Box::pin(strm)
    }

    pub async fn run(
        &mut self,
        input: PipelineInput,
        mode: GenerationMode,
    ) -> Result<Vec<QueryResponse>, PipelineError> {
        let mut responses = Vec::with_capacity(input.len());
        let mut strm = self.run_stream(input, mode);
        while let Some(progress) = strm.next().await {
            responses.extend(progress?.responses);
        }
        Ok(responses)
    }
}
