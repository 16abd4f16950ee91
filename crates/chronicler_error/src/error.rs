//! Top-level error wrapper types.

use crate::{
    BuilderError, ConfigError, GenerationError, JsonError, PipelineError, RetryableError,
    StorageError,
};

/// Every failure a Chronicler operation can report.
///
/// # Examples
///
/// ```
/// use chronicler_error::{ChroniclerError, ConfigError};
///
/// let err: ChroniclerError = ConfigError::new("missing model").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ChroniclerErrorKind {
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Persistence error
    #[from(StorageError)]
    Storage(StorageError),
    /// Text-generation error
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Chapter pipeline error
    #[from(PipelineError)]
    Pipeline(PipelineError),
}

/// Chronicler error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Chronicler Error: {}", _0)]
pub struct ChroniclerError(Box<ChroniclerErrorKind>);

impl ChroniclerError {
    /// Create a new error from a kind.
    pub fn new(kind: ChroniclerErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ChroniclerErrorKind {
        &self.0
    }

    /// The generation failure kind, when this is a generation error.
    pub fn generation_kind(&self) -> Option<&crate::GenerationErrorKind> {
        match self.kind() {
            ChroniclerErrorKind::Generation(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// The pipeline failure kind, when this is a pipeline error.
    pub fn pipeline_kind(&self) -> Option<&crate::PipelineErrorKind> {
        match self.kind() {
            ChroniclerErrorKind::Pipeline(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// Whether this error carries a duplicate-chapter commit rejection.
    pub fn is_duplicate_commit(&self) -> bool {
        matches!(self.kind(), ChroniclerErrorKind::Storage(e) if e.kind.is_duplicate_commit())
    }
}

impl RetryableError for ChroniclerError {
    fn is_retryable(&self) -> bool {
        match self.kind() {
            ChroniclerErrorKind::Generation(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl<T> From<T> for ChroniclerError
where
    T: Into<ChroniclerErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Chronicler operations.
pub type ChroniclerResult<T> = std::result::Result<T, ChroniclerError>;
