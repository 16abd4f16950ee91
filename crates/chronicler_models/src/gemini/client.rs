//! Gemini driver implementation.

use super::conversion;
use super::dto::{BatchEmbedResponse, GenerateContentResponse};
use async_trait::async_trait;
use chronicler_core::{EmbeddingTask, GenerateRequest, GenerateResponse};
use chronicler_error::{ChroniclerResult, ConfigError, GenerationError, GenerationErrorKind};
use chronicler_interface::{Embeddings, GenerationDriver};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 768;

/// Driver for the Google Gemini REST API.
///
/// One call per invocation; retries and rate limiting belong to
/// [`GenerationClient`](crate::GenerationClient).
#[derive(Clone)]
pub struct GeminiDriver {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: String,
    embedding_dimensions: usize,
}

impl std::fmt::Debug for GeminiDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiDriver")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

impl GeminiDriver {
    /// Create a driver with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the key or model is blank.
    #[instrument(skip_all, fields(model = model.as_ref()))]
    pub fn new(api_key: impl Into<String>, model: impl AsRef<str>) -> ChroniclerResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::new("Gemini API key is empty").into());
        }
        if model.as_ref().trim().is_empty() {
            return Err(ConfigError::new("Gemini model name is empty").into());
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.as_ref().to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        })
    }

    /// Create a driver reading the key from `GEMINI_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the variable is not set.
    pub fn from_env(model: impl AsRef<str>) -> ChroniclerResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ConfigError::new("GEMINI_API_KEY environment variable not set"))?;
        Self::new(api_key, model)
    }

    /// Point the driver at another endpoint (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a different embedding model and dimensionality.
    pub fn with_embedding_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.embedding_model = model.into();
        self.embedding_dimensions = dimensions;
        self
    }

    async fn post<B, T>(&self, url: &str, body: &B) -> ChroniclerResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                GenerationError::new(GenerationErrorKind::Network(format!(
                    "request failed: {}",
                    e
                )))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(
                GenerationError::new(conversion::error_from_status(status.as_u16(), &body)).into(),
            );
        }

        response.json::<T>().await.map_err(|e| {
            GenerationError::new(GenerationErrorKind::MalformedResponse(e.to_string())).into()
        })
    }
}

#[async_trait]
impl GenerationDriver for GeminiDriver {
    #[instrument(skip(self, req), fields(provider = "gemini", model = req.model.as_deref().unwrap_or(&self.model)))]
    async fn generate(&self, req: &GenerateRequest) -> ChroniclerResult<GenerateResponse> {
        let model = req.model.as_deref().unwrap_or(&self.model);
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!(url = %url, "Sending Gemini generateContent request");

        let body = conversion::to_generate_request(req);
        let response: GenerateContentResponse = self.post(&url, &body).await?;
        conversion::from_generate_response(response)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embeddings for GeminiDriver {
    #[instrument(skip(self, inputs), fields(provider = "gemini", count = inputs.len()))]
    async fn embed(
        &self,
        inputs: &[String],
        task: EmbeddingTask,
    ) -> ChroniclerResult<Vec<Vec<f32>>> {
        let url = format!(
            "{}/models/{}:batchEmbedContents",
            self.base_url, self.embedding_model
        );
        let body = conversion::to_embed_request(&self.embedding_model, inputs, task);
        let response: BatchEmbedResponse = self.post(&url, &body).await?;
        Ok(conversion::from_embed_response(response))
    }

    fn embedding_dimensions(&self) -> usize {
        self.embedding_dimensions
    }
}
