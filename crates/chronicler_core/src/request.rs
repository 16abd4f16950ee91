//! Request and response types for the generation capability.

use serde::{Deserialize, Serialize};

/// One text-generation call.
///
/// # Examples
///
/// ```
/// use chronicler_core::GenerateRequest;
///
/// let request = GenerateRequest::new("You are a careful editor.", "Tighten this paragraph.")
///     .with_temperature(0.3)
///     .with_max_output_tokens(512);
///
/// assert_eq!(request.temperature, Some(0.3));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GenerateRequest {
    /// Role and standing instructions
    pub system_prompt: String,
    /// Task for this call
    pub prompt: String,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Output budget in tokens
    pub max_output_tokens: Option<u32>,
    /// Model override
    pub model: Option<String>,
}

impl GenerateRequest {
    /// Request with a system prompt and a user prompt.
    pub fn new(system_prompt: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output budget.
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Override the model.
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Rough token estimate for rate limiting.
    pub fn estimated_tokens(&self) -> u64 {
        crate::text::estimate_tokens(&self.system_prompt)
            + crate::text::estimate_tokens(&self.prompt)
            + self.max_output_tokens.unwrap_or(0) as u64
    }
}

/// Token accounting for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u64,
    /// Tokens produced
    pub output_tokens: u64,
}

impl Usage {
    /// Prompt plus output tokens.
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.output_tokens
    }
}

/// Result of a successful call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text
    pub text: String,
    /// Token accounting
    pub usage: Usage,
}

/// Purpose an embedding is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbeddingTask {
    /// Text stored for later retrieval
    RetrievalDocument,
    /// Query matched against stored text
    RetrievalQuery,
    /// Symmetric similarity comparison
    SemanticSimilarity,
}
