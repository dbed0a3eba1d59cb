//! CLI-specific error types
//!
//! Compile rejections keep the compiler's code so callers see the same
//! `RQ_*` code on stdout and stderr.

use std::fmt;
use std::io;

use crate::compiler::{CompileError, CompileErrorCode};
use crate::schema::SchemaError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Request is not a valid expression tree
    RequestError,
    /// Index schema could not be loaded
    SchemaError,
    /// Compiler rejected the request
    Compile(CompileErrorCode),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "RQ_CLI_CONFIG_ERROR",
            Self::IoError => "RQ_CLI_IO_ERROR",
            Self::RequestError => "RQ_CLI_REQUEST_ERROR",
            Self::SchemaError => "RQ_CLI_SCHEMA_ERROR",
            Self::Compile(code) => code.code(),
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Malformed request
    pub fn request_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::RequestError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::new(CliErrorCode::SchemaError, format!("{} ({})", e, e.code()))
    }
}

impl From<CompileError> for CliError {
    fn from(e: CompileError) -> Self {
        Self::new(CliErrorCode::Compile(e.code()), e.message())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
