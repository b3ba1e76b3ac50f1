//! Error types and exit codes for the scopewalk CLI.
//!
//! `CliError` is the single error type the command functions return. Library
//! errors are bridged in through `From`, and every variant maps to a stable
//! `OutputErrorCode` that doubles as the process exit code:
//!
//! - `2`: Invalid arguments (bad flags, unreadable config)
//! - `3`: Resolution errors (input file missing, no node at a path)
//! - `4`: Transform errors (the library refused an operation)
//! - `10`: Internal errors

use std::fmt;

use scopewalk_ast::AstError;
use scopewalk_traverse::TraverseError;
use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output and process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from the caller.
    InvalidArguments = 2,
    /// A file or node the command needs could not be found.
    ResolutionError = 3,
    /// The tree could not be loaded or edited.
    TransformError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Every way a scopewalk command can fail.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid arguments from the caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Input file not found or unreadable.
    #[error("cannot read {path}: {message}")]
    FileNotFound { path: String, message: String },

    /// No node at the requested location.
    #[error("no node at `{at}`")]
    NodeNotFound { at: String },

    /// The input is not a tree the catalog accepts.
    #[error(transparent)]
    Ast(#[from] AstError),

    /// Traversal, scope or mutation failure.
    #[error(transparent)]
    Traverse(#[from] TraverseError),

    /// Anything else.
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl CliError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        CliError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CliError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

impl From<&CliError> for OutputErrorCode {
    fn from(err: &CliError) -> Self {
        match err {
            CliError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            CliError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            CliError::NodeNotFound { .. } => OutputErrorCode::ResolutionError,
            CliError::Ast(_) => OutputErrorCode::TransformError,
            CliError::Traverse(TraverseError::Ast(_)) => OutputErrorCode::TransformError,
            CliError::Traverse(TraverseError::InfiniteCycle { .. }) => OutputErrorCode::InternalError,
            CliError::Traverse(_) => OutputErrorCode::TransformError,
            CliError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::invalid_args(format!("invalid JSON: {}", err))
    }
}
