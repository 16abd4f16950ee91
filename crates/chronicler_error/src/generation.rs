//! Generation-capability error types and retry classification.

/// Failure conditions reported by the text-generation capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GenerationErrorKind {
    /// Provider asked us to slow down (HTTP 429 or equivalent)
    #[display("Throttled by provider: {}", _0)]
    Throttled(String),
    /// Provider temporarily unavailable (5xx)
    #[display("Provider unavailable: {}", _0)]
    Unavailable(String),
    /// Transport-level failure before a response arrived
    #[display("Network failure: {}", _0)]
    Network(String),
    /// Call exceeded its wall-clock budget
    #[display("Call timed out after {} seconds", _0)]
    Timeout(u64),
    /// Provider rejected the request as malformed
    #[display("Invalid input: {}", _0)]
    InvalidInput(String),
    /// Credentials or model configuration are wrong
    #[display("Provider configuration error: {}", _0)]
    Configuration(String),
    /// Account quota is spent and will not recover by waiting
    #[display("Quota exhausted: {}", _0)]
    Quota(String),
    /// HTTP failure not covered by a more specific kind
    #[display("HTTP {} error: {}", status_code, message)]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Provider answered without any usable text
    #[display("Provider returned an empty response")]
    EmptyResponse,
    /// Response could not be decoded
    #[display("Malformed provider response: {}", _0)]
    MalformedResponse(String),
    /// Transient failures persisted through every retry
    #[display("Retries exhausted after {} attempts: {}", attempts, last)]
    RetryExhausted {
        /// Number of attempts made, including the first
        attempts: usize,
        /// The last transient failure observed
        last: Box<GenerationErrorKind>,
    },
}

impl GenerationErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationErrorKind::Throttled(_)
            | GenerationErrorKind::Unavailable(_)
            | GenerationErrorKind::Network(_)
            | GenerationErrorKind::Timeout(_) => true,
            GenerationErrorKind::Http { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }

    /// Map an HTTP status and body to the most specific kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronicler_error::GenerationErrorKind;
    ///
    /// let kind = GenerationErrorKind::from_status(429, "slow down");
    /// assert!(matches!(kind, GenerationErrorKind::Throttled(_)));
    /// assert!(kind.is_retryable());
    /// ```
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            429 if message.to_lowercase().contains("quota") => {
                GenerationErrorKind::Quota(message)
            }
            429 => GenerationErrorKind::Throttled(message),
            500 | 502 | 503 | 504 => GenerationErrorKind::Unavailable(message),
            408 => GenerationErrorKind::Network(message),
            400 | 404 | 413 | 422 => GenerationErrorKind::InvalidInput(message),
            401 | 403 => GenerationErrorKind::Configuration(message),
            _ => GenerationErrorKind::Http {
                status_code,
                message,
            },
        }
    }
}

/// Generation error with source location tracking.
///
/// # Examples
///
/// ```
/// use chronicler_error::{GenerationError, GenerationErrorKind, RetryableError};
///
/// let err = GenerationError::new(GenerationErrorKind::Unavailable("503".to_string()));
/// assert!(err.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The kind of error that occurred
    pub kind: GenerationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Trait for errors that support retry logic.
///
/// Transient errors (throttling, unavailability, network failures, timeouts)
/// return true from [`is_retryable`](RetryableError::is_retryable). Invalid
/// input, configuration and quota errors are permanent.
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for GenerationError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
