//! Schema loading errors

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while loading index schemas
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Schema file could not be read
    #[error("Failed to read schema '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Schema file is not valid JSON for an index schema
    #[error("Malformed schema '{path}': {reason}")]
    Malformed { path: String, reason: String },
}

impl SchemaError {
    /// Create a malformed schema error
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::Io { .. } => "RQ_SCHEMA_IO",
            SchemaError::Malformed { .. } => "RQ_SCHEMA_MALFORMED",
        }
    }
}
