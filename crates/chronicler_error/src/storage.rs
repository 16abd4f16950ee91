//! Storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Requested entity does not exist
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// A chapter with this number is already committed for the project
    #[display("Chapter {} of project '{}' is already committed", chapter, project_id)]
    DuplicateCommit {
        /// Project identifier
        project_id: String,
        /// Chapter number that already exists
        chapter: u32,
    },
    /// Commit would leave a gap in the chapter sequence
    #[display("Chapter {} of project '{}' does not follow chapter {}", chapter, project_id, latest)]
    NonContiguous {
        /// Project identifier
        project_id: String,
        /// Chapter number offered for commit
        chapter: u32,
        /// Highest committed chapter
        latest: u32,
    },
    /// Failed to read from the backing store
    #[display("Failed to read: {}", _0)]
    Read(String),
    /// Failed to write to the backing store
    #[display("Failed to write: {}", _0)]
    Write(String),
    /// Stored data could not be (de)serialized
    #[display("Serialization failed: {}", _0)]
    Serialization(String),
    /// Storage backend is unavailable
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
}

impl StorageErrorKind {
    /// Whether this error is the insert-if-absent guard firing.
    pub fn is_duplicate_commit(&self) -> bool {
        matches!(self, StorageErrorKind::DuplicateCommit { .. })
    }
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use chronicler_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::DuplicateCommit {
///     project_id: "p1".to_string(),
///     chapter: 4,
/// });
/// assert!(format!("{}", err).contains("already committed"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
