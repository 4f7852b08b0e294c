use std::path::Path;

use thiserror::Error;

// Error message prefixes
const MSG_FAILED_TO_PREFIX: &str = "Failed to";
const MSG_INVALID_PREFIX: &str = "Invalid";

/// Result type for the `bprust_schema` library
pub type Result<T> = std::result::Result<T, error_stack::Report<Error>>;

/// Errors raised while exporting or reading a schema document
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing an export file failed
    #[error("File operation failed: {0}")]
    FileOperation(String),

    /// The document text is not a valid schema document
    #[error("Schema parse error: {0}")]
    Parse(String),

    /// The descriptor graph could not be rendered
    #[error("Schema serialization error: {0}")]
    Serialization(String),

    /// A document entry violates a descriptor invariant
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

impl Error {
    /// Create an "Invalid X" error
    pub fn invalid(what: &str, details: impl std::fmt::Display) -> Self {
        Self::InvalidSchema(format!("{MSG_INVALID_PREFIX} {what}: {details}"))
    }

    /// Create error for IO operations
    pub fn io_failed(operation: &str, path: &Path, error: impl std::fmt::Display) -> Self {
        Self::FileOperation(format!(
            "{MSG_FAILED_TO_PREFIX} {operation} {}: {error}",
            path.display()
        ))
    }
}
