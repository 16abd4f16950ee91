//! Trait definitions for text-generation providers.

use async_trait::async_trait;
use chronicler_core::{EmbeddingTask, GenerateRequest, GenerateResponse};
use chronicler_error::ChroniclerResult;

/// Core trait every text-generation provider implements.
///
/// Implementations make exactly one provider call per invocation. Rate
/// limiting, retries and timeouts are layered on top by the generation client.
#[async_trait]
pub trait GenerationDriver: Send + Sync {
    /// Generate text for a single request.
    async fn generate(&self, req: &GenerateRequest) -> ChroniclerResult<GenerateResponse>;

    /// Provider name (e.g., "gemini").
    fn provider_name(&self) -> &'static str;

    /// Default model identifier.
    fn model_name(&self) -> &str;
}

/// Providers that can embed text.
#[async_trait]
pub trait Embeddings: GenerationDriver {
    /// Embed a batch of inputs, one vector per input, in input order.
    async fn embed(
        &self,
        inputs: &[String],
        task: EmbeddingTask,
    ) -> ChroniclerResult<Vec<Vec<f32>>>;

    /// Dimensionality of the returned vectors.
    fn embedding_dimensions(&self) -> usize;

    /// Largest batch the provider accepts in one call.
    fn max_batch_size(&self) -> usize {
        100
    }
}

#[async_trait]
impl<T: GenerationDriver + ?Sized> GenerationDriver for std::sync::Arc<T> {
    async fn generate(&self, req: &GenerateRequest) -> ChroniclerResult<GenerateResponse> {
        (**self).generate(req).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

#[async_trait]
impl<T: Embeddings + ?Sized> Embeddings for std::sync::Arc<T> {
    async fn embed(
        &self,
        inputs: &[String],
        task: EmbeddingTask,
    ) -> ChroniclerResult<Vec<Vec<f32>>> {
        (**self).embed(inputs, task).await
    }

    fn embedding_dimensions(&self) -> usize {
        (**self).embedding_dimensions()
    }

    fn max_batch_size(&self) -> usize {
        (**self).max_batch_size()
    }
}
