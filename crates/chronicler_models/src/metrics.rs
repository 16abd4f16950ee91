//! Metrics for generation calls.
//!
//! OpenTelemetry instruments for request counts, failures, latency and token
//! usage. They are no-ops until the host installs a meter provider.

use chronicler_error::{ChroniclerError, ChroniclerErrorKind, GenerationErrorKind};
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::OnceLock;

static METRICS: OnceLock<LlmMetrics> = OnceLock::new();

/// Metrics for generation calls, labeled by provider and model.
#[derive(Clone)]
pub struct LlmMetrics {
    /// Meter handle kept alive for metric instruments
    _meter: Meter,
    /// Successful calls
    pub requests: Counter<u64>,
    /// Failed calls, after retries
    pub errors: Counter<u64>,
    /// Call duration in seconds, including retries
    pub duration: Histogram<f64>,
    /// Prompt tokens used
    pub prompt_tokens: Counter<u64>,
    /// Output tokens produced
    pub output_tokens: Counter<u64>,
    /// Texts embedded
    pub embeddings: Counter<u64>,
}

impl LlmMetrics {
    fn init() -> Self {
        let meter = global::meter("chronicler_generation");

        Self {
            _meter: meter.clone(),
            requests: meter
                .u64_counter("generation.requests")
                .with_description("Successful generation calls")
                .build(),
            errors: meter
                .u64_counter("generation.errors")
                .with_description("Failed generation calls")
                .build(),
            duration: meter
                .f64_histogram("generation.duration")
                .with_unit("seconds")
                .with_description("Generation call duration including retries")
                .build(),
            prompt_tokens: meter
                .u64_counter("generation.tokens.prompt")
                .with_description("Prompt tokens used")
                .build(),
            output_tokens: meter
                .u64_counter("generation.tokens.output")
                .with_description("Output tokens produced")
                .build(),
            embeddings: meter
                .u64_counter("generation.embeddings")
                .with_description("Texts embedded")
                .build(),
        }
    }

    /// Get the global metrics instance.
    pub fn get() -> &'static Self {
        METRICS.get_or_init(Self::init)
    }

    /// Record a successful call.
    pub fn record_request(&self, provider: &str, model: &str, duration_secs: f64) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
        ];
        self.requests.add(1, labels);
        self.duration.record(duration_secs, labels);
    }

    /// Record a failed call.
    pub fn record_error(&self, provider: &str, model: &str, error_type: &str) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
            KeyValue::new("error_type", error_type.to_string()),
        ];
        self.errors.add(1, labels);
    }

    /// Record token usage.
    pub fn record_tokens(&self, model: &str, prompt_tokens: u64, output_tokens: u64) {
        let labels = &[KeyValue::new("model", model.to_string())];
        self.prompt_tokens.add(prompt_tokens, labels);
        self.output_tokens.add(output_tokens, labels);
    }

    /// Record embedded texts.
    pub fn record_embeddings(&self, provider: &str, count: u64) {
        self.embeddings
            .add(count, &[KeyValue::new("provider", provider.to_string())]);
    }
}

impl Default for LlmMetrics {
    fn default() -> Self {
        Self::get().clone()
    }
}

/// Classify an error for metrics labeling.
///
/// Returns one of: "retry_exhausted", "rate_limit", "unavailable", "network",
/// "timeout", "invalid_request", "configuration", "quota", "response", "other".
pub fn classify_error(error: &ChroniclerError) -> &'static str {
    match error.kind() {
        ChroniclerErrorKind::Generation(e) => match &e.kind {
            GenerationErrorKind::RetryExhausted { .. } => "retry_exhausted",
            GenerationErrorKind::Throttled(_) => "rate_limit",
            GenerationErrorKind::Unavailable(_) => "unavailable",
            GenerationErrorKind::Network(_) => "network",
            GenerationErrorKind::Timeout(_) => "timeout",
            GenerationErrorKind::InvalidInput(_) => "invalid_request",
            GenerationErrorKind::Configuration(_) => "configuration",
            GenerationErrorKind::Quota(_) => "quota",
            GenerationErrorKind::EmptyResponse | GenerationErrorKind::MalformedResponse(_) => {
                "response"
            }
            GenerationErrorKind::Http { .. } => "other",
        },
        ChroniclerErrorKind::Config(_) => "configuration",
        _ => "other",
    }
}
