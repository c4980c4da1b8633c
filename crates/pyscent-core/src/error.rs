//! Error types and exit code constants for pyscent.
//!
//! This module provides a unified error type (`ScentError`) that bridges
//! errors from the analysis and persistence subsystems into a common format
//! suitable for CLI output.
//!
//! ## Exit Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (file not found, unreadable input)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! ## Design
//!
//! - **Unified type**: `ScentError` is the single error type for CLI output
//! - **Bridging**: `impl From<X> for ScentError` bridges subsystem errors
//! - **Code mapping**: `ErrorCode` provides stable integer exit codes

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes reported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (file not found, unreadable input).
    ResolutionError = 3,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl ErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Result alias used across the pyscent crates.
pub type ScentResult<T> = Result<T, ScentError>;

/// Unified error type for CLI output.
///
/// This is the canonical error type that subsystem errors are converted to
/// before being rendered to the user. Each variant carries enough context to
/// produce a helpful message.
#[derive(Debug, Error)]
pub enum ScentError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// File not found or unreadable.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// A tags file could not be read.
    #[error("could not read tags file {path}: {source}")]
    TagsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tags file could not be written.
    #[error("could not write tags file {path}: {source}")]
    TagsWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tags file did not deserialize into a symbol table.
    #[error("malformed tags file {path}: {source}")]
    TagsFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A single source unit could not be analyzed.
    #[error("could not analyze {path}: {message}")]
    Analysis { path: String, message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&ScentError> for ErrorCode {
    fn from(err: &ScentError) -> Self {
        match err {
            ScentError::InvalidArguments { .. } => ErrorCode::InvalidArguments,
            ScentError::FileNotFound { .. } => ErrorCode::ResolutionError,
            ScentError::TagsRead { .. } => ErrorCode::ResolutionError,
            ScentError::TagsWrite { .. } => ErrorCode::ResolutionError,
            ScentError::TagsFormat { .. } => ErrorCode::InvalidArguments,
            ScentError::Analysis { .. } => ErrorCode::ResolutionError,
            ScentError::InternalError { .. } => ErrorCode::InternalError,
        }
    }
}

impl From<ScentError> for ErrorCode {
    fn from(err: ScentError) -> Self {
        ErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl ScentError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        ScentError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        ScentError::FileNotFound { path: path.into() }
    }

    /// Create an analysis error for a single source unit.
    pub fn analysis(path: impl Into<String>, message: impl Into<String>) -> Self {
        ScentError::Analysis {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ScentError::InternalError {
            message: message.into(),
        }
    }

    /// Get the exit code for this error.
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
