//! Chapter pipeline error types.

/// Failure conditions raised by the chapter orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// The Architect produced no parseable outline, even after the fallback
    #[display("Outline could not be parsed: {}", _0)]
    InvalidOutline(String),
    /// Every rewrite attempt was rejected
    #[display(
        "Chapter rejected after {} attempts (last score {}): {}",
        attempts,
        score,
        issues.join("; ")
    )]
    QualityRejection {
        /// Writer invocations made
        attempts: u32,
        /// Score from the last critic report
        score: u32,
        /// Issues from the last critic report
        issues: Vec<String>,
    },
    /// Another run holds the lease for this project
    #[display("Project '{}' already has a chapter run in progress", _0)]
    ProjectBusy(String),
    /// The run was cancelled at a phase boundary
    #[display("Run cancelled during {}", _0)]
    Cancelled(String),
    /// The project has already reached its target chapter count
    #[display("Project '{}' reached its target of {} chapters", project_id, target)]
    TargetReached {
        /// Project identifier
        project_id: String,
        /// Target chapter count
        target: u32,
    },
    /// Genre tag has no registered profile
    #[display("Unknown genre: {}", _0)]
    UnknownGenre(String),
}

/// Error type for the chapter pipeline.
///
/// # Examples
///
/// ```
/// use chronicler_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::ProjectBusy("p1".to_string()));
/// assert!(format!("{}", err).contains("in progress"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The kind of error that occurred
    pub kind: PipelineErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new pipeline error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
