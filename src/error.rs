//! Unified error type and exit-code mapping.
//!
//! Every failure in the pipeline funnels into [`GraftError`] before it
//! reaches the CLI. The taxonomy is small and strictly terminal: nothing is
//! retried, and every variant that can be raised before the publish step
//! guarantees the destination file has not been touched.
//!
//! The error hierarchy follows these principles:
//! - **Unified type**: `GraftError` is the single error type for CLI output
//! - **Consolidated messages**: multi-offender failures (unresolved
//!   candidates, syntax errors) report every case in one message
//! - **Code mapping**: `OutputErrorCode` provides stable integer codes for
//!   exit status and JSON error envelopes

use std::fmt;
use std::io;
use std::path::Path;

use thiserror::Error;

/// Convenience alias used by every fallible operation in the crate.
pub type GraftResult<T> = Result<T, GraftError>;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable error codes for exit status and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (missing input file, bad path).
    InvalidArguments = 2,
    /// Resolution errors (unreadable input, parse failure, nothing to
    /// graft, unresolved candidates).
    ResolutionError = 3,
    /// Apply errors (filesystem failure while publishing the result).
    ApplyError = 4,
    /// Internal errors (rewrite-plan verification failure; a bug).
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

/// Unified error type for the graft pipeline.
///
/// The first four variants are the run-level taxonomy raised before any
/// mutation; `Io` covers publish-phase filesystem failures, which propagate
/// as-is; `Internal` marks plan-verification failures that should never
/// happen on well-formed input.
#[derive(Debug, Error)]
pub enum GraftError {
    /// Source file missing or not a regular file.
    #[error("source file does not exist: {path}")]
    SourceMissing { path: String },

    /// Destination file missing or not a regular file.
    #[error("destination file does not exist: {path}")]
    DestinationMissing { path: String },

    /// An input file exists but could not be read.
    #[error("unable to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Source or destination failed to parse as Python.
    #[error("unable to parse {path}: {detail}")]
    Parse { path: String, detail: String },

    /// The source file contains no function or method definitions.
    #[error("no function or method definitions found in source file: {path}")]
    NoDefinitions { path: String },

    /// One or more source candidates have no matching destination
    /// definition. Carries the rendered text of every offender so a caller
    /// can fix all mismatches in one pass.
    #[error(
        "unable to find destination definitions matching the following source definitions from {path}:\n{}",
        .renders.join("\n")
    )]
    UnresolvedMatches { path: String, renders: Vec<String> },

    /// Filesystem failure during the publish sequence.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Rewrite-plan verification failure.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl GraftError {
    /// Create a SourceMissing error from a path.
    pub fn source_missing(path: &Path) -> Self {
        GraftError::SourceMissing {
            path: path.display().to_string(),
        }
    }

    /// Create a DestinationMissing error from a path.
    pub fn destination_missing(path: &Path) -> Self {
        GraftError::DestinationMissing {
            path: path.display().to_string(),
        }
    }

    /// Create a Read error from a path and its I/O cause.
    pub fn read(path: &Path, source: io::Error) -> Self {
        GraftError::Read {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create a Parse error from a path and a syntax-error summary.
    pub fn parse(path: &Path, detail: impl Into<String>) -> Self {
        GraftError::Parse {
            path: path.display().to_string(),
            detail: detail.into(),
        }
    }

    /// Create a NoDefinitions error from a path.
    pub fn no_definitions(path: &Path) -> Self {
        GraftError::NoDefinitions {
            path: path.display().to_string(),
        }
    }

    /// Create an UnresolvedMatches error from a path and the rendered text
    /// of every unresolved candidate.
    pub fn unresolved(path: &Path, renders: Vec<String>) -> Self {
        GraftError::UnresolvedMatches {
            path: path.display().to_string(),
            renders,
        }
    }

    /// Create an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        GraftError::Internal {
            message: message.into(),
        }
    }

    /// Get the output error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&GraftError> for OutputErrorCode {
    fn from(err: &GraftError) -> Self {
        match err {
            GraftError::SourceMissing { .. } | GraftError::DestinationMissing { .. } => {
                OutputErrorCode::InvalidArguments
            }
            GraftError::Read { .. }
            | GraftError::Parse { .. }
            | GraftError::NoDefinitions { .. }
            | GraftError::UnresolvedMatches { .. } => OutputErrorCode::ResolutionError,
            GraftError::Io(_) => OutputErrorCode::ApplyError,
            GraftError::Internal { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<GraftError> for OutputErrorCode {
    fn from(err: GraftError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Tests
// ============================================================================
