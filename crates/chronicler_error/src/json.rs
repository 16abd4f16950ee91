//! Encoding and decoding failures for persisted records and model output.

/// A value could not be encoded to or decoded from JSON.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error: {} at line {} in {}", message, line, file)]
pub struct JsonError {
    /// Parser or serializer message
    pub message: String,
    /// Line of the call that failed
    pub line: u32,
    /// Source file of the call that failed
    pub file: &'static str,
}

impl JsonError {
    /// Error at the caller's location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
