//! Resilient generation client.

use crate::{LlmMetrics, classify_error};
use chronicler_core::{EmbeddingTask, GenerateRequest, GenerateResponse};
use chronicler_error::{ChroniclerResult, GenerationError, GenerationErrorKind};
use chronicler_interface::{Embeddings, GenerationDriver};
use chronicler_rate_limit::{RateLimiter, RetryPolicy};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Turns prompts into text while hiding transient provider failures.
///
/// Every call waits for a permit from the shared [`RateLimiter`], runs under
/// the [`RetryPolicy`]'s wall-clock timeout and is retried with exponential
/// backoff on throttling, unavailability, network failures and timeouts.
/// Cloning is cheap and clones share the driver and the limiter.
pub struct GenerationClient<D> {
    driver: Arc<D>,
    limiter: RateLimiter,
    policy: RetryPolicy,
    embedding_batch_size: usize,
}

impl<D> Clone for GenerationClient<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            limiter: self.limiter.clone(),
            policy: self.policy.clone(),
            embedding_batch_size: self.embedding_batch_size,
        }
    }
}

impl<D> std::fmt::Debug for GenerationClient<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("limiter", &self.limiter)
            .field("policy", &self.policy)
            .field("embedding_batch_size", &self.embedding_batch_size)
            .finish()
    }
}

impl<D: GenerationDriver> GenerationClient<D> {
    /// Wrap a driver with the shared limiter and a retry policy.
    pub fn new(driver: D, limiter: RateLimiter, policy: RetryPolicy) -> Self {
        Self {
            driver: Arc::new(driver),
            limiter,
            policy,
            embedding_batch_size: 100,
        }
    }

    /// Set the maximum number of texts sent per embedding call.
    pub fn with_embedding_batch_size(mut self, size: usize) -> Self {
        self.embedding_batch_size = size.max(1);
        self
    }

    /// The wrapped driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The retry policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate text for one request.
    ///
    /// Returns the provider's text and usage on success. Transient failures
    /// surface only as `GenerationErrorKind::RetryExhausted`; invalid input,
    /// configuration and quota errors are returned without retrying. A blank
    /// response is reported as `GenerationErrorKind::EmptyResponse`.
    #[instrument(
        skip(self, request),
        fields(
            provider = self.driver.provider_name(),
            model = request.model.as_deref().unwrap_or(self.driver.model_name()),
            prompt_chars = request.prompt.len()
        )
    )]
    pub async fn generate(&self, request: &GenerateRequest) -> ChroniclerResult<GenerateResponse> {
        let provider = self.driver.provider_name();
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.driver.model_name().to_string());
        let metrics = LlmMetrics::get();
        let started = Instant::now();

        let result = self
            .limiter
            .execute(&self.policy, || self.driver.generate(request))
            .await
            .and_then(|response| {
                if response.text.trim().is_empty() {
                    Err(GenerationError::new(GenerationErrorKind::EmptyResponse).into())
                } else {
                    Ok(response)
                }
            });

        match &result {
            Ok(response) => {
                let elapsed = started.elapsed().as_secs_f64();
                metrics.record_request(provider, &model, elapsed);
                metrics.record_tokens(
                    &model,
                    response.usage.prompt_tokens,
                    response.usage.output_tokens,
                );
                debug!(
                    elapsed_secs = elapsed,
                    output_chars = response.text.len(),
                    "Generation succeeded"
                );
            }
            Err(e) => {
                metrics.record_error(provider, &model, classify_error(e));
                warn!(error = %e, "Generation failed");
            }
        }
        result
    }
}

impl<D: Embeddings> GenerationClient<D> {
    /// Embed texts in batches, one entry per input.
    ///
    /// Batches share the generation retry discipline. When a batch fails for
    /// good, or returns the wrong number of vectors, its items are retried one
    /// at a time; an item that still fails, or whose vector has the wrong
    /// dimension, yields `None`. Configuration and quota errors abort the
    /// whole call.
    #[instrument(skip(self, texts), fields(provider = self.driver.provider_name(), count = texts.len()))]
    pub async fn embed(
        &self,
        texts: &[String],
        task: EmbeddingTask,
    ) -> ChroniclerResult<Vec<Option<Vec<f32>>>> {
        let batch_size = self
            .embedding_batch_size
            .min(self.driver.max_batch_size())
            .max(1);
        let dimensions = self.driver.embedding_dimensions();
        let mut out = Vec::with_capacity(texts.len());

        for batch in texts.chunks(batch_size) {
            match self.embed_batch(batch, task).await {
                Ok(vectors) if vectors.len() == batch.len() => {
                    out.extend(vectors.into_iter().map(|v| check_dimensions(v, dimensions)));
                }
                Ok(vectors) => {
                    warn!(
                        expected = batch.len(),
                        received = vectors.len(),
                        "Embedding batch size mismatch, retrying items individually"
                    );
                    out.extend(self.embed_items(batch, task, dimensions).await?);
                }
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    warn!(error = %e, "Embedding batch failed, retrying items individually");
                    out.extend(self.embed_items(batch, task, dimensions).await?);
                }
            }
        }

        LlmMetrics::get().record_embeddings(
            self.driver.provider_name(),
            out.iter().filter(|v| v.is_some()).count() as u64,
        );
        Ok(out)
    }

    async fn embed_batch(
        &self,
        batch: &[String],
        task: EmbeddingTask,
    ) -> ChroniclerResult<Vec<Vec<f32>>> {
        self.limiter
            .execute(&self.policy, || self.driver.embed(batch, task))
            .await
    }

    async fn embed_items(
        &self,
        items: &[String],
        task: EmbeddingTask,
        dimensions: usize,
    ) -> ChroniclerResult<Vec<Option<Vec<f32>>>> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match self.embed_batch(std::slice::from_ref(item), task).await {
                Ok(mut vectors) if vectors.len() == 1 => {
                    out.push(check_dimensions(vectors.remove(0), dimensions));
                }
                Ok(_) => out.push(None),
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    warn!(error = %e, "Embedding item failed");
                    out.push(None);
                }
            }
        }
        Ok(out)
    }
}

fn check_dimensions(vector: Vec<f32>, dimensions: usize) -> Option<Vec<f32>> {
    if vector.len() == dimensions {
        Some(vector)
    } else {
        warn!(
            expected = dimensions,
            received = vector.len(),
            "Discarding embedding with wrong dimension"
        );
        None
    }
}

fn is_fatal(error: &chronicler_error::ChroniclerError) -> bool {
    matches!(
        error.generation_kind(),
        Some(GenerationErrorKind::Configuration(_)) | Some(GenerationErrorKind::Quota(_))
    )
}
